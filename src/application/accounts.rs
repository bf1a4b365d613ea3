//! Account Service
//!
//! Registration, wallet lifecycle and trading preferences for chat users.
//! Everything is keyed by the external telegram id; the ledger store owns
//! the records.

use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::adapters::solana::{WalletError, WalletManager};
use crate::domain::{
    default_settings, NewUser, SettingsPatch, TokenBalance, TradingSettings, TransactionRecord,
    User, UserPatch, UserWallet,
};
use crate::ports::store::{LedgerStore, StoreError};

// Base58-encoded 64-byte secrets are 87-88 chars; the bounds leave headroom
// for other valid encodings without accepting obvious garbage.
const MIN_KEY_LEN: usize = 60;
const MAX_KEY_LEN: usize = 100;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("User {0} is not registered")]
    UserNotFound(String),
    #[error("A wallet is already attached to this account")]
    WalletExists,
    #[error("Private key length {0} is outside the expected range")]
    KeyLengthOutOfRange(usize),
    #[error(transparent)]
    InvalidKey(#[from] WalletError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Display fields carried by the chat platform alongside the stable id.
#[derive(Debug, Clone, Default)]
pub struct Profile {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

pub struct AccountService {
    store: Arc<dyn LedgerStore>,
}

impl AccountService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Fetches the user for a telegram id, creating the account on first
    /// contact. Display fields are refreshed on every call since the chat
    /// platform lets users rename themselves.
    pub async fn register(
        &self,
        telegram_id: &str,
        profile: Profile,
    ) -> Result<User, AccountError> {
        if let Some(existing) = self.store.user_by_telegram_id(telegram_id).await {
            let updated = self
                .store
                .update_user(
                    existing.id,
                    UserPatch {
                        username: profile.username,
                        first_name: profile.first_name,
                        last_name: profile.last_name,
                        ..Default::default()
                    },
                )
                .await?;
            return Ok(updated);
        }

        let user = self
            .store
            .create_user(NewUser {
                telegram_id: telegram_id.to_string(),
                username: profile.username,
                first_name: profile.first_name,
                last_name: profile.last_name,
                wallet: None,
            })
            .await?;
        info!(telegram_id, "new user registered");
        Ok(user)
    }

    pub async fn user(&self, telegram_id: &str) -> Result<User, AccountError> {
        self.store
            .user_by_telegram_id(telegram_id)
            .await
            .ok_or_else(|| AccountError::UserNotFound(telegram_id.to_string()))
    }

    /// Generates a fresh keypair and attaches it to the account. Refused when
    /// a wallet already exists; replacing a custodial key would orphan funds.
    pub async fn create_wallet(&self, telegram_id: &str) -> Result<User, AccountError> {
        let user = self.user(telegram_id).await?;
        if user.wallet.is_some() {
            return Err(AccountError::WalletExists);
        }

        let manager = WalletManager::new_random();
        let address = manager.public_key();
        let updated = self
            .store
            .update_user(
                user.id,
                UserPatch {
                    wallet: Some(UserWallet {
                        address: address.clone(),
                        private_key: manager.export_base58(),
                    }),
                    ..Default::default()
                },
            )
            .await?;
        info!(telegram_id, %address, "wallet generated");
        Ok(updated)
    }

    /// Imports an existing base58 private key. The address is derived from
    /// the key, never trusted from the caller.
    pub async fn import_wallet(
        &self,
        telegram_id: &str,
        private_key: &str,
    ) -> Result<User, AccountError> {
        let user = self.user(telegram_id).await?;
        if user.wallet.is_some() {
            return Err(AccountError::WalletExists);
        }

        let trimmed = private_key.trim();
        if trimmed.len() < MIN_KEY_LEN || trimmed.len() > MAX_KEY_LEN {
            return Err(AccountError::KeyLengthOutOfRange(trimmed.len()));
        }
        let manager = WalletManager::from_base58(trimmed)?;

        let address = manager.public_key();
        let updated = self
            .store
            .update_user(
                user.id,
                UserPatch {
                    wallet: Some(UserWallet {
                        address: address.clone(),
                        private_key: manager.export_base58(),
                    }),
                    ..Default::default()
                },
            )
            .await?;
        info!(telegram_id, %address, "wallet imported");
        Ok(updated)
    }

    /// Current settings, falling back to the documented defaults for users
    /// who never changed anything. The defaults are not persisted until the
    /// first explicit update.
    pub async fn settings(&self, telegram_id: &str) -> Result<TradingSettings, AccountError> {
        let user = self.user(telegram_id).await?;
        Ok(self
            .store
            .trading_settings(user.id)
            .await
            .unwrap_or_else(|| default_settings(user.id)))
    }

    /// Merges the patch into the stored settings; untouched fields keep
    /// their previous values.
    pub async fn update_settings(
        &self,
        telegram_id: &str,
        patch: SettingsPatch,
    ) -> Result<TradingSettings, AccountError> {
        let user = self.user(telegram_id).await?;
        Ok(self.store.upsert_trading_settings(user.id, patch).await?)
    }

    /// Trade history, newest first.
    pub async fn history(
        &self,
        telegram_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<TransactionRecord>, AccountError> {
        let user = self.user(telegram_id).await?;
        Ok(self.store.user_transactions(user.id, limit).await)
    }

    /// Stored token balances for the account.
    pub async fn balances(&self, telegram_id: &str) -> Result<Vec<TokenBalance>, AccountError> {
        let user = self.user(telegram_id).await?;
        Ok(self.store.user_token_balances(user.id).await)
    }

    pub async fn user_id(&self, telegram_id: &str) -> Result<Uuid, AccountError> {
        Ok(self.user(telegram_id).await?.id)
    }
}
