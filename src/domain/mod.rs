//! Core domain types for the trade execution and account ledger engine.
//!
//! Everything in here is plain data and pure functions: users and their
//! custodial wallets, ledger records, amount conversions, and the price
//! impact guardrails. No I/O.

pub mod amounts;
pub mod impact;
pub mod models;

pub use amounts::{
    display_amount, format_token_amount, lamports_to_sol, sol_to_lamports, to_raw_units,
    token_display_decimal,
};
pub use impact::{
    enforce_impact_ceiling, impact_warning, ImpactError, IMPACT_REJECT_PCT, IMPACT_WARN_PCT,
};
pub use models::{
    default_settings, NewTokenBalance, NewTransaction, NewUser, SettingsPatch, TokenBalance,
    TradeSide, TradingSettings, TransactionPatch, TransactionRecord, TransactionStatus, User,
    UserPatch, UserWallet,
};

/// Wrapped SOL mint. Jupiter routes native SOL through this address.
pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sol_mint_matches_spl_native_mint() {
        assert_eq!(SOL_MINT, spl_token::native_mint::ID.to_string());
    }
}
