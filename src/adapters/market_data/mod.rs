//! Market Data Adapters
//!
//! Token directory lookups and the USD price provider chain: Birdeye when a
//! key is configured, CoinGecko, then a Jupiter quote as the proxy of last
//! resort.

mod birdeye;
mod coingecko;
mod dex_quote;
mod token_directory;

pub use birdeye::BirdeyeSource;
pub use coingecko::CoingeckoSource;
pub use dex_quote::DexQuoteSource;
pub use token_directory::TokenDirectory;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("No data in response for: {0}")]
    MissingData(String),
}
