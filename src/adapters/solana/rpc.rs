use async_trait::async_trait;
use solana_client::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_client::rpc_request::TokenAccountsFilter;
use solana_sdk::{
    commitment_config::CommitmentConfig, pubkey::Pubkey, signature::Signature,
    transaction::VersionedTransaction,
};
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

use crate::domain::SOL_MINT;
use crate::ports::chain::{ChainPort, ConfirmationStatus, RpcError, TokenAmount};

/// Cluster the RPC endpoint belongs to. Airdrops are devnet-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Devnet,
}

impl Network {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "mainnet" | "mainnet-beta" => Some(Self::Mainnet),
            "devnet" => Some(Self::Devnet),
            _ => None,
        }
    }

    pub fn is_devnet(&self) -> bool {
        matches!(self, Self::Devnet)
    }
}

/// Chain access over the sync Solana RPC client, made async-compatible by
/// running every call on the blocking pool.
pub struct SolanaRpc {
    client: Arc<RpcClient>,
    network: Network,
}

impl SolanaRpc {
    pub fn new(rpc_url: String, network: Network) -> Self {
        let client = Arc::new(RpcClient::new_with_commitment(
            rpc_url,
            CommitmentConfig::confirmed(),
        ));
        Self { client, network }
    }

    pub fn network(&self) -> Network {
        self.network
    }
}

// Default when an account, mint or query cannot be resolved. Nine decimals
// is the most common mint precision.
const ZERO_BALANCE: TokenAmount = TokenAmount {
    amount: 0,
    decimals: 9,
};

#[async_trait]
impl ChainPort for SolanaRpc {
    async fn sol_balance(&self, address: &str) -> u64 {
        let pubkey = match Pubkey::from_str(address) {
            Ok(pk) => pk,
            Err(err) => {
                warn!(address, error = %err, "invalid pubkey in balance query");
                return 0;
            }
        };

        let client = Arc::clone(&self.client);
        let result =
            tokio::task::spawn_blocking(move || client.get_balance(&pubkey)).await;
        match result {
            Ok(Ok(lamports)) => lamports,
            Ok(Err(err)) => {
                warn!(address, error = %err, "balance query failed");
                0
            }
            Err(err) => {
                warn!(error = %err, "balance task join failed");
                0
            }
        }
    }

    async fn token_balance(&self, owner: &str, mint: &str) -> TokenAmount {
        // Wrapped SOL is the native balance wearing a mint address.
        if mint == SOL_MINT {
            return TokenAmount {
                amount: self.sol_balance(owner).await,
                decimals: 9,
            };
        }

        let (owner_pk, mint_pk) = match (Pubkey::from_str(owner), Pubkey::from_str(mint)) {
            (Ok(o), Ok(m)) => (o, m),
            _ => {
                warn!(owner, mint, "invalid pubkey in token balance query");
                return ZERO_BALANCE;
            }
        };

        let client = Arc::clone(&self.client);
        let result = tokio::task::spawn_blocking(move || -> Result<TokenAmount, String> {
            let accounts = client
                .get_token_accounts_by_owner(&owner_pk, TokenAccountsFilter::Mint(mint_pk))
                .map_err(|e| e.to_string())?;
            let Some(first) = accounts.first() else {
                return Ok(ZERO_BALANCE);
            };
            let account_pk = Pubkey::from_str(&first.pubkey).map_err(|e| e.to_string())?;
            let balance = client
                .get_token_account_balance(&account_pk)
                .map_err(|e| e.to_string())?;
            let amount = balance.amount.parse::<u64>().map_err(|e| e.to_string())?;
            Ok(TokenAmount {
                amount,
                decimals: balance.decimals,
            })
        })
        .await;

        match result {
            Ok(Ok(amount)) => amount,
            Ok(Err(err)) => {
                warn!(owner, mint, error = %err, "token balance query failed");
                ZERO_BALANCE
            }
            Err(err) => {
                warn!(error = %err, "token balance task join failed");
                ZERO_BALANCE
            }
        }
    }

    async fn send_transaction(&self, tx: &VersionedTransaction) -> Result<String, RpcError> {
        let tx = tx.clone();
        let client = Arc::clone(&self.client);

        tokio::task::spawn_blocking(move || {
            let config = RpcSendTransactionConfig {
                max_retries: Some(3),
                ..Default::default()
            };
            client
                .send_transaction_with_config(&tx, config)
                .map(|sig| sig.to_string())
                .map_err(|e| RpcError::Submission(e.to_string()))
        })
        .await
        .map_err(|e| RpcError::Client(format!("Task join error: {}", e)))?
    }

    async fn confirmation_status(&self, signature: &str) -> ConfirmationStatus {
        let signature = match Signature::from_str(signature) {
            Ok(sig) => sig,
            Err(err) => {
                warn!(signature, error = %err, "unparseable signature in status query");
                return ConfirmationStatus::Unknown;
            }
        };

        let client = Arc::clone(&self.client);
        let result =
            tokio::task::spawn_blocking(move || client.get_signature_statuses(&[signature]))
                .await;

        match result {
            Ok(Ok(response)) => match response.value.into_iter().next().flatten() {
                Some(status) => {
                    if let Some(err) = status.err {
                        ConfirmationStatus::Failed(err.to_string())
                    } else if status.satisfies_commitment(CommitmentConfig::confirmed()) {
                        ConfirmationStatus::Confirmed
                    } else {
                        ConfirmationStatus::Pending
                    }
                }
                // Not seen by the node yet; stay in the polling window.
                None => ConfirmationStatus::Pending,
            },
            Ok(Err(err)) => {
                warn!(error = %err, "signature status query failed");
                ConfirmationStatus::Pending
            }
            Err(err) => {
                warn!(error = %err, "signature status task join failed");
                ConfirmationStatus::Pending
            }
        }
    }

    async fn request_airdrop(&self, address: &str, lamports: u64) -> Result<String, RpcError> {
        if !self.network.is_devnet() {
            return Err(RpcError::AirdropUnavailable);
        }
        let pubkey = Pubkey::from_str(address)
            .map_err(|e| RpcError::InvalidPubkey(e.to_string()))?;

        let client = Arc::clone(&self.client);
        tokio::task::spawn_blocking(move || {
            client
                .request_airdrop(&pubkey, lamports)
                .map(|sig| sig.to_string())
                .map_err(|e| RpcError::Client(e.to_string()))
        })
        .await
        .map_err(|e| RpcError::Client(format!("Task join error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = SolanaRpc::new("https://api.devnet.solana.com".to_string(), Network::Devnet);
        assert_eq!(client.network(), Network::Devnet);
    }

    #[test]
    fn test_network_parse() {
        assert_eq!(Network::parse("devnet"), Some(Network::Devnet));
        assert_eq!(Network::parse("mainnet"), Some(Network::Mainnet));
        assert_eq!(Network::parse("mainnet-beta"), Some(Network::Mainnet));
        assert_eq!(Network::parse("testnet"), None);
    }

    #[tokio::test]
    async fn test_airdrop_rejected_off_devnet() {
        let client = SolanaRpc::new(
            "https://api.mainnet-beta.solana.com".to_string(),
            Network::Mainnet,
        );
        // Rejected before any RPC traffic happens.
        let err = client
            .request_airdrop("So11111111111111111111111111111111111111112", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, RpcError::AirdropUnavailable));
    }

    #[test]
    fn test_error_display() {
        let err = RpcError::Client("test".to_string());
        assert!(err.to_string().contains("RPC request failed"));

        let err = RpcError::AirdropUnavailable;
        assert!(err.to_string().contains("devnet"));
    }
}
