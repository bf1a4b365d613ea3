use async_trait::async_trait;

/// One provider in the price lookup chain. Providers are consulted in
/// registration order; the first `Some` wins.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Providers that need missing credentials report unavailable and are
    /// skipped without being queried.
    fn is_available(&self) -> bool {
        true
    }

    /// USD price for a mint. `None` on any failure; the chain moves on.
    async fn usd_price(&self, token_address: &str) -> Option<f64>;
}
