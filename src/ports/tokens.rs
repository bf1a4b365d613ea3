use async_trait::async_trait;

use crate::adapters::market_data::MarketError;
use crate::market::TokenInfo;

/// Verified-token directory: the external metadata catalogue.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenDirectoryPort: Send + Sync {
    /// The full verified token list.
    async fn verified_tokens(&self) -> Result<Vec<TokenInfo>, MarketError>;

    /// Metadata for a single mint. Unknown mints are an error, not a blank.
    async fn token_by_address(&self, address: &str) -> Result<TokenInfo, MarketError>;
}
