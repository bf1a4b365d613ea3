use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    NewTokenBalance, NewTransaction, NewUser, SettingsPatch, TokenBalance, TradingSettings,
    TransactionPatch, TransactionRecord, User, UserPatch,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },
    #[error("telegram id {0} is already registered")]
    DuplicateTelegramId(String),
    #[error("transaction signature {0} is already recorded")]
    DuplicateSignature(String),
}

/// Persistence boundary for users, transactions, balances and settings.
///
/// Implementations own all record invariants:
/// - `telegram_id` is unique across users.
/// - transaction `signature` is unique when present.
/// - new transactions start `Pending` with no `confirmed_at`.
/// - `confirmed_at` is stamped exactly when status transitions to `Confirmed`.
/// - token balances hold at most one row per (user, token) pair.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn user(&self, id: Uuid) -> Option<User>;

    async fn user_by_telegram_id(&self, telegram_id: &str) -> Option<User>;

    async fn create_user(&self, new: NewUser) -> Result<User, StoreError>;

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<User, StoreError>;

    async fn transaction(&self, id: Uuid) -> Option<TransactionRecord>;

    async fn transaction_by_signature(&self, signature: &str) -> Option<TransactionRecord>;

    /// Records for one user, newest first. `limit` defaults to 50.
    async fn user_transactions(
        &self,
        user_id: Uuid,
        limit: Option<usize>,
    ) -> Vec<TransactionRecord>;

    async fn create_transaction(
        &self,
        new: NewTransaction,
    ) -> Result<TransactionRecord, StoreError>;

    async fn update_transaction(
        &self,
        id: Uuid,
        patch: TransactionPatch,
    ) -> Result<TransactionRecord, StoreError>;

    async fn user_token_balances(&self, user_id: Uuid) -> Vec<TokenBalance>;

    async fn token_balance(&self, user_id: Uuid, token_address: &str) -> Option<TokenBalance>;

    /// Replaces the stored balance for the (user, token) pair, creating the
    /// row if absent. `last_updated` is refreshed either way.
    async fn upsert_token_balance(
        &self,
        new: NewTokenBalance,
    ) -> Result<TokenBalance, StoreError>;

    async fn trading_settings(&self, user_id: Uuid) -> Option<TradingSettings>;

    /// Merges the patch into existing settings, or creates settings from the
    /// defaults with the patch applied on top.
    async fn upsert_trading_settings(
        &self,
        user_id: Uuid,
        patch: SettingsPatch,
    ) -> Result<TradingSettings, StoreError>;
}
