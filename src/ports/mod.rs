//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - The account and transaction ledger (persistence)
//! - Chain access (balances, submission, confirmation)
//! - The DEX aggregator (quotes and swaps)
//! - USD price providers
//! - The verified-token metadata directory

pub mod chain;
pub mod dex;
pub mod prices;
pub mod store;
pub mod tokens;

pub use chain::{ChainPort, ConfirmationStatus, RpcError, TokenAmount};
pub use dex::{DexPort, SwapOutcome, SwapParams};
pub use prices::PriceSource;
pub use store::{LedgerStore, StoreError};
pub use tokens::TokenDirectoryPort;
