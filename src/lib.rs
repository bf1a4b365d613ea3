//! Swapdesk - Trade Execution & Account Ledger Engine
//!
//! Custodial wallet management and token swaps on Solana via the Jupiter
//! aggregator, with price-impact guardrails and an in-memory ledger of
//! users, trades, balances and preferences.
//!
//! # Modules
//!
//! - `domain`: Core types (User, TransactionRecord, TokenBalance), amount
//!   conversions and the price-impact policy
//! - `ports`: Trait abstractions (LedgerStore, DexPort, ChainPort,
//!   PriceSource, TokenDirectoryPort)
//! - `ledger`: In-memory `LedgerStore` implementation
//! - `market`: Cached token metadata and USD price service
//! - `adapters`: External implementations (Jupiter, Solana RPC, market
//!   data providers, CLI)
//! - `application`: Trade engine and account service
//! - `config`: Configuration loading and validation

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ledger;
pub mod market;
pub mod ports;
