//! Conversions between raw chain units and display amounts.
//!
//! SOL amounts cross the lamport boundary exactly once, here. Token amounts
//! are formatted to six decimal places for ledger records and chat output.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use solana_sdk::native_token::LAMPORTS_PER_SOL;

/// SOL display amount to lamports, truncating below one lamport.
pub fn sol_to_lamports(sol: Decimal) -> u64 {
    (sol * Decimal::from(LAMPORTS_PER_SOL))
        .trunc()
        .to_u64()
        .unwrap_or(0)
}

/// Lamports to a SOL display amount at full 9-decimal precision.
pub fn lamports_to_sol(lamports: u64) -> Decimal {
    let mut value = Decimal::from(lamports);
    value.set_scale(9).unwrap_or_default();
    value
}

/// Raw token units to a display decimal at the mint's precision.
pub fn token_display_decimal(raw: u64, decimals: u8) -> Decimal {
    let mut value = Decimal::from(raw);
    if value.set_scale(decimals as u32).is_err() {
        return Decimal::ZERO;
    }
    value
}

/// Raw token units as a six-decimal-place display value, e.g. `9.000000`.
pub fn display_amount(raw: u64, decimals: u8) -> Decimal {
    let mut value = token_display_decimal(raw, decimals).round_dp(6);
    value.rescale(6);
    value
}

/// Raw token units formatted with exactly six decimal places, e.g. `"9.000000"`.
pub fn format_token_amount(raw: u64, decimals: u8) -> String {
    display_amount(raw, decimals).to_string()
}

/// Display amount back to raw units. `None` when the result overflows u64.
pub fn to_raw_units(amount: Decimal, decimals: u8) -> Option<u64> {
    let factor = Decimal::from(10u64.checked_pow(decimals as u32)?);
    (amount * factor).trunc().to_u64()
}
