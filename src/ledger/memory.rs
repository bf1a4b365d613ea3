use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    default_settings, NewTokenBalance, NewTransaction, NewUser, SettingsPatch, TokenBalance,
    TradingSettings, TransactionPatch, TransactionRecord, TransactionStatus, User, UserPatch,
};
use crate::ports::store::{LedgerStore, StoreError};

/// In-memory ledger. Mutations run entirely under a write guard, so every
/// check-then-insert (unique telegram id, unique signature, balance upsert)
/// is atomic with respect to other store calls.
#[derive(Default)]
pub struct MemoryLedger {
    users: RwLock<HashMap<Uuid, User>>,
    transactions: RwLock<HashMap<Uuid, TransactionRecord>>,
    // Keyed by (user, mint) so one row per pair holds by construction.
    balances: RwLock<HashMap<(Uuid, String), TokenBalance>>,
    // Keyed by user id, one settings row per user.
    settings: RwLock<HashMap<Uuid, TradingSettings>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn user(&self, id: Uuid) -> Option<User> {
        self.users.read().await.get(&id).cloned()
    }

    async fn user_by_telegram_id(&self, telegram_id: &str) -> Option<User> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.telegram_id == telegram_id)
            .cloned()
    }

    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.telegram_id == new.telegram_id) {
            return Err(StoreError::DuplicateTelegramId(new.telegram_id));
        }
        let user = User {
            id: Uuid::new_v4(),
            telegram_id: new.telegram_id,
            username: new.username,
            first_name: new.first_name,
            last_name: new.last_name,
            wallet: new.wallet,
            is_active: true,
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "user",
            id,
        })?;
        if let Some(username) = patch.username {
            user.username = Some(username);
        }
        if let Some(first_name) = patch.first_name {
            user.first_name = Some(first_name);
        }
        if let Some(last_name) = patch.last_name {
            user.last_name = Some(last_name);
        }
        if let Some(wallet) = patch.wallet {
            user.wallet = Some(wallet);
        }
        if let Some(is_active) = patch.is_active {
            user.is_active = is_active;
        }
        Ok(user.clone())
    }

    async fn transaction(&self, id: Uuid) -> Option<TransactionRecord> {
        self.transactions.read().await.get(&id).cloned()
    }

    async fn transaction_by_signature(&self, signature: &str) -> Option<TransactionRecord> {
        self.transactions
            .read()
            .await
            .values()
            .find(|t| t.signature.as_deref() == Some(signature))
            .cloned()
    }

    async fn user_transactions(
        &self,
        user_id: Uuid,
        limit: Option<usize>,
    ) -> Vec<TransactionRecord> {
        let mut records: Vec<TransactionRecord> = self
            .transactions
            .read()
            .await
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(limit.unwrap_or(50));
        records
    }

    async fn create_transaction(
        &self,
        new: NewTransaction,
    ) -> Result<TransactionRecord, StoreError> {
        let mut transactions = self.transactions.write().await;
        if let Some(sig) = &new.signature {
            if transactions
                .values()
                .any(|t| t.signature.as_deref() == Some(sig.as_str()))
            {
                return Err(StoreError::DuplicateSignature(sig.clone()));
            }
        }
        let record = TransactionRecord {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            signature: new.signature,
            side: new.side,
            token_address: new.token_address,
            token_symbol: new.token_symbol,
            token_name: new.token_name,
            amount: new.amount,
            sol_amount: new.sol_amount,
            price: new.price,
            status: TransactionStatus::Pending,
            slippage: new.slippage,
            fees: new.fees,
            metadata: new.metadata,
            created_at: Utc::now(),
            confirmed_at: None,
        };
        transactions.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_transaction(
        &self,
        id: Uuid,
        patch: TransactionPatch,
    ) -> Result<TransactionRecord, StoreError> {
        let mut transactions = self.transactions.write().await;
        if let Some(sig) = &patch.signature {
            if transactions
                .values()
                .any(|t| t.id != id && t.signature.as_deref() == Some(sig.as_str()))
            {
                return Err(StoreError::DuplicateSignature(sig.clone()));
            }
        }
        let record = transactions.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "transaction",
            id,
        })?;
        if let Some(signature) = patch.signature {
            record.signature = Some(signature);
        }
        if let Some(status) = patch.status {
            if status == TransactionStatus::Confirmed && record.confirmed_at.is_none() {
                record.confirmed_at = Some(Utc::now());
            }
            record.status = status;
        }
        if let Some(price) = patch.price {
            record.price = Some(price);
        }
        if let Some(fees) = patch.fees {
            record.fees = Some(fees);
        }
        if let Some(metadata) = patch.metadata {
            record.metadata = Some(metadata);
        }
        Ok(record.clone())
    }

    async fn user_token_balances(&self, user_id: Uuid) -> Vec<TokenBalance> {
        let mut rows: Vec<TokenBalance> = self
            .balances
            .read()
            .await
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.token_address.cmp(&b.token_address));
        rows
    }

    async fn token_balance(&self, user_id: Uuid, token_address: &str) -> Option<TokenBalance> {
        self.balances
            .read()
            .await
            .get(&(user_id, token_address.to_string()))
            .cloned()
    }

    async fn upsert_token_balance(
        &self,
        new: NewTokenBalance,
    ) -> Result<TokenBalance, StoreError> {
        let mut balances = self.balances.write().await;
        let key = (new.user_id, new.token_address.clone());
        let row = balances
            .entry(key)
            .and_modify(|b| {
                b.token_symbol = new.token_symbol.clone();
                b.token_name = new.token_name.clone();
                b.balance = new.balance;
                b.last_updated = Utc::now();
            })
            .or_insert_with(|| TokenBalance {
                id: Uuid::new_v4(),
                user_id: new.user_id,
                token_address: new.token_address,
                token_symbol: new.token_symbol,
                token_name: new.token_name,
                balance: new.balance,
                last_updated: Utc::now(),
            });
        Ok(row.clone())
    }

    async fn trading_settings(&self, user_id: Uuid) -> Option<TradingSettings> {
        self.settings.read().await.get(&user_id).cloned()
    }

    async fn upsert_trading_settings(
        &self,
        user_id: Uuid,
        patch: SettingsPatch,
    ) -> Result<TradingSettings, StoreError> {
        let mut settings = self.settings.write().await;
        let row = settings
            .entry(user_id)
            .or_insert_with(|| default_settings(user_id));
        if let Some(default_slippage) = patch.default_slippage {
            row.default_slippage = default_slippage;
        }
        if let Some(max_transaction_amount) = patch.max_transaction_amount {
            row.max_transaction_amount = max_transaction_amount;
        }
        if let Some(auto_confirm) = patch.auto_confirm {
            row.auto_confirm = auto_confirm;
        }
        if let Some(notifications) = patch.notifications {
            row.notifications = notifications;
        }
        Ok(row.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_user() -> NewUser {
        NewUser {
            telegram_id: "12345".to_string(),
            username: Some("trader".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn rejects_duplicate_telegram_id() {
        let store = MemoryLedger::new();
        store.create_user(sample_user()).await.unwrap();
        let err = store.create_user(sample_user()).await.unwrap_err();
        assert_eq!(err, StoreError::DuplicateTelegramId("12345".to_string()));
    }

    #[tokio::test]
    async fn new_transactions_start_pending_without_confirmed_at() {
        let store = MemoryLedger::new();
        let user = store.create_user(sample_user()).await.unwrap();
        let record = store
            .create_transaction(NewTransaction {
                user_id: user.id,
                signature: Some("sig1".to_string()),
                side: crate::domain::TradeSide::Buy,
                token_address: "Mint111".to_string(),
                token_symbol: None,
                token_name: None,
                amount: dec!(1),
                sol_amount: dec!(0.1),
                price: None,
                slippage: None,
                fees: None,
                metadata: None,
            })
            .await
            .unwrap();
        assert_eq!(record.status, TransactionStatus::Pending);
        assert!(record.confirmed_at.is_none());
    }

    #[tokio::test]
    async fn confirmed_at_stamped_only_on_confirmation() {
        let store = MemoryLedger::new();
        let user = store.create_user(sample_user()).await.unwrap();
        let record = store
            .create_transaction(NewTransaction {
                user_id: user.id,
                signature: None,
                side: crate::domain::TradeSide::Sell,
                token_address: "Mint111".to_string(),
                token_symbol: None,
                token_name: None,
                amount: dec!(5),
                sol_amount: dec!(0.2),
                price: None,
                slippage: None,
                fees: None,
                metadata: None,
            })
            .await
            .unwrap();

        let failed = store
            .update_transaction(
                record.id,
                TransactionPatch {
                    status: Some(TransactionStatus::Failed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(failed.confirmed_at.is_none());

        let confirmed = store
            .update_transaction(
                record.id,
                TransactionPatch {
                    status: Some(TransactionStatus::Confirmed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(confirmed.confirmed_at.is_some());
    }
}
