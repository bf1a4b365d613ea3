//! CLI Command Definitions
//!
//! Argument parsing for the swapdesk driver binary. The commands exercise
//! the engine's data contracts directly: quotes, prices, wallet generation
//! and balance lookups. Handlers live in the binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Swapdesk - custodial trade execution engine for Solana/Jupiter
#[derive(Parser, Debug)]
#[command(
    name = "swapdesk",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Trade execution and account ledger engine for Solana/Jupiter",
    long_about = "Swapdesk quotes and executes token swaps through the Jupiter \
                  aggregator with price-impact guardrails, and keeps a ledger of \
                  users, trades and balances."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true, default_value = "config.toml")]
    pub config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Get a quote for a token swap
    Quote(QuoteCmd),

    /// Look up a token's USD price
    Price(PriceCmd),

    /// Generate a fresh wallet keypair
    Wallet(WalletCmd),

    /// Check SOL or token balances for an address
    Balance(BalanceCmd),
}

/// Get swap quote
#[derive(Parser, Debug)]
pub struct QuoteCmd {
    /// Input token (mint address, or a verified symbol like SOL)
    #[arg(value_name = "INPUT")]
    pub input_token: String,

    /// Output token (mint address, or a verified symbol like USDC)
    #[arg(value_name = "OUTPUT")]
    pub output_token: String,

    /// Amount of the input token, in display units
    #[arg(value_name = "AMOUNT")]
    pub amount: f64,

    /// Slippage tolerance in basis points (default: 100 = 1%)
    #[arg(long, value_name = "BPS", default_value = "100")]
    pub slippage: u16,
}

/// Look up token price
#[derive(Parser, Debug)]
pub struct PriceCmd {
    /// Token to price (mint address, or a verified symbol)
    #[arg(value_name = "TOKEN")]
    pub token: String,
}

/// Generate a wallet keypair
#[derive(Parser, Debug)]
pub struct WalletCmd {
    /// Print only the keypair, no banner (for scripting)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Check balances
#[derive(Parser, Debug)]
pub struct BalanceCmd {
    /// Wallet address to query
    #[arg(value_name = "ADDRESS")]
    pub address: String,

    /// Also show the balance for this token mint
    #[arg(long, value_name = "MINT")]
    pub token: Option<String>,
}
