//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Jupiter: DEX aggregator API client
//! - Solana: RPC client and wallet management
//! - Market Data: token directory and the USD price provider chain
//! - CLI: command-line argument definitions

pub mod cli;
pub mod jupiter;
pub mod market_data;
pub mod solana;

pub use cli::CliApp;
pub use jupiter::JupiterClient;
pub use market_data::TokenDirectory;
pub use solana::{SolanaRpc, WalletManager};
