//! CLI Adapter
//!
//! Command-line interface for the swapdesk engine.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{BalanceCmd, CliApp, Command, PriceCmd, QuoteCmd, WalletCmd};
