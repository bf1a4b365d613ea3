use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Custodial wallet bound to a user. Address and private key always travel
/// together; a user has either both or neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserWallet {
    /// Base58 public key.
    pub address: String,
    /// Base58-encoded 64-byte secret key. Never logged.
    pub private_key: String,
}

/// A registered chat user and their custodial wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// External chat identity. Unique, immutable once assigned.
    pub telegram_id: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub wallet: Option<UserWallet>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Wallet address, if a wallet is attached.
    pub fn wallet_address(&self) -> Option<&str> {
        self.wallet.as_ref().map(|w| w.address.as_str())
    }
}

/// Fields for creating a new user. Id, activity flag and timestamp are
/// assigned by the store.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub telegram_id: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub wallet: Option<UserWallet>,
}

/// Partial update for a user. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub wallet: Option<UserWallet>,
    pub is_active: Option<bool>,
}

/// Which way a swap moves value: SOL into a token, or a token back to SOL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "buy"),
            TradeSide::Sell => write!(f, "sell"),
        }
    }
}

/// Lifecycle of a recorded swap. Every record starts `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Failed,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Confirmed => write!(f, "confirmed"),
            TransactionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Ledger record of one executed or attempted swap.
///
/// Invariant: `confirmed_at` is non-null iff `status == Confirmed`. The store
/// stamps `confirmed_at` on the transition; callers never supply it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    /// On-chain signature. Unique when present; pending records may lack one.
    pub signature: Option<String>,
    pub side: TradeSide,
    pub token_address: String,
    pub token_symbol: Option<String>,
    pub token_name: Option<String>,
    /// Received quantity in display units, 9-decimal fixed precision domain.
    pub amount: Decimal,
    /// Native-currency side of the trade, in SOL.
    pub sol_amount: Decimal,
    pub price: Option<Decimal>,
    pub status: TransactionStatus,
    pub slippage: Option<Decimal>,
    pub fees: Option<Decimal>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

/// Fields for creating a transaction record. Status is forced to `Pending`
/// and `confirmed_at` to `None` by the store.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: Uuid,
    pub signature: Option<String>,
    pub side: TradeSide,
    pub token_address: String,
    pub token_symbol: Option<String>,
    pub token_name: Option<String>,
    pub amount: Decimal,
    pub sol_amount: Decimal,
    pub price: Option<Decimal>,
    pub slippage: Option<Decimal>,
    pub fees: Option<Decimal>,
    pub metadata: Option<serde_json::Value>,
}

/// Partial update for a transaction record. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct TransactionPatch {
    pub signature: Option<String>,
    pub status: Option<TransactionStatus>,
    pub price: Option<Decimal>,
    pub fees: Option<Decimal>,
    pub metadata: Option<serde_json::Value>,
}

/// Cached SPL token holding, at most one record per (user, token) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_address: String,
    pub token_symbol: Option<String>,
    pub token_name: Option<String>,
    /// Non-negative, display units.
    pub balance: Decimal,
    pub last_updated: DateTime<Utc>,
}

/// Upsert payload for a token balance.
#[derive(Debug, Clone)]
pub struct NewTokenBalance {
    pub user_id: Uuid,
    pub token_address: String,
    pub token_symbol: Option<String>,
    pub token_name: Option<String>,
    pub balance: Decimal,
}

/// Per-user trading preferences, one record per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingSettings {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Percent, recommended domain 0.1 to 5. Not hard-enforced by the store.
    pub default_slippage: Decimal,
    /// SOL cap per trade.
    pub max_transaction_amount: Decimal,
    pub auto_confirm: bool,
    pub notifications: bool,
}

impl TradingSettings {
    /// Default slippage converted to basis points (1% -> 100 bps).
    pub fn slippage_bps(&self) -> u16 {
        use rust_decimal::prelude::ToPrimitive;
        (self.default_slippage * dec!(100))
            .round()
            .to_u16()
            .unwrap_or(100)
    }
}

/// Partial update for trading settings. `None` fields are left untouched;
/// on first write missing fields take the documented defaults.
#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    pub default_slippage: Option<Decimal>,
    pub max_transaction_amount: Option<Decimal>,
    pub auto_confirm: Option<bool>,
    pub notifications: Option<bool>,
}

/// Defaults applied when settings are first created for a user.
pub fn default_settings(user_id: Uuid) -> TradingSettings {
    TradingSettings {
        id: Uuid::new_v4(),
        user_id,
        default_slippage: dec!(1),
        max_transaction_amount: dec!(1),
        auto_confirm: false,
        notifications: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trade_side_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TradeSide::Buy).unwrap(), "\"buy\"");
        assert_eq!(serde_json::to_string(&TradeSide::Sell).unwrap(), "\"sell\"");
    }

    #[test]
    fn status_display_matches_wire_form() {
        assert_eq!(TransactionStatus::Pending.to_string(), "pending");
        assert_eq!(TransactionStatus::Confirmed.to_string(), "confirmed");
        assert_eq!(TransactionStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn default_settings_match_documented_values() {
        let user_id = Uuid::new_v4();
        let settings = default_settings(user_id);
        assert_eq!(settings.user_id, user_id);
        assert_eq!(settings.default_slippage, dec!(1));
        assert_eq!(settings.max_transaction_amount, dec!(1));
        assert!(!settings.auto_confirm);
        assert!(settings.notifications);
    }

    #[test]
    fn slippage_bps_rounds_percent() {
        let mut settings = default_settings(Uuid::new_v4());
        assert_eq!(settings.slippage_bps(), 100);
        settings.default_slippage = dec!(0.5);
        assert_eq!(settings.slippage_bps(), 50);
        settings.default_slippage = dec!(2.55);
        assert_eq!(settings.slippage_bps(), 255);
    }
}
