use async_trait::async_trait;
use solana_sdk::transaction::VersionedTransaction;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("RPC request failed: {0}")]
    Client(String),
    #[error("transaction submission failed: {0}")]
    Submission(String),
    #[error("invalid public key: {0}")]
    InvalidPubkey(String),
    #[error("airdrops are only available on devnet")]
    AirdropUnavailable,
}

/// Raw SPL token amount paired with its mint's precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenAmount {
    pub amount: u64,
    pub decimals: u8,
}

/// Where a submitted transaction landed, as far as the RPC node can tell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    Pending,
    Confirmed,
    Failed(String),
    /// Not resolved within the polling window. The record stays pending.
    Unknown,
}

/// Read and submit access to the chain.
///
/// Balance reads are total: failures degrade to zero so display paths never
/// error out. Adapters log the underlying cause.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainPort: Send + Sync {
    /// Lamports held by `address`. Zero on any failure.
    async fn sol_balance(&self, address: &str) -> u64;

    /// Raw units of `mint` held by `owner` across its token accounts.
    /// Zero amount with the queried precision (or 0) on any failure.
    async fn token_balance(&self, owner: &str, mint: &str) -> TokenAmount;

    /// Submits a signed transaction and returns its signature.
    async fn send_transaction(&self, tx: &VersionedTransaction) -> Result<String, RpcError>;

    async fn confirmation_status(&self, signature: &str) -> ConfirmationStatus;

    /// Devnet only. `RpcError::AirdropUnavailable` elsewhere.
    async fn request_airdrop(&self, address: &str, lamports: u64) -> Result<String, RpcError>;

    /// Polls until the transaction leaves `Pending` or the window closes.
    async fn wait_for_confirmation(
        &self,
        signature: &str,
        interval: Duration,
        max_polls: u32,
    ) -> ConfirmationStatus {
        for _ in 0..max_polls {
            match self.confirmation_status(signature).await {
                ConfirmationStatus::Pending => tokio::time::sleep(interval).await,
                terminal => return terminal,
            }
        }
        ConfirmationStatus::Unknown
    }
}
