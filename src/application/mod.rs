//! Application Layer - use cases wired over the ports
//!
//! `TradeEngine` drives the quote-confirm-execute-record pipeline;
//! `AccountService` handles registration, wallets and preferences.

pub mod accounts;
pub mod engine;

pub use accounts::{AccountError, AccountService, Profile};
pub use engine::{EngineConfig, TradeEngine, TradeError, TradeOutcome, TradePreview, TradeRequest};
