use async_trait::async_trait;
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::adapters::jupiter::QuoteRequest;
use crate::domain::SOL_MINT;
use crate::market::DEFAULT_SOL_PRICE_USD;
use crate::ports::{DexPort, PriceSource, TokenDirectoryPort};

use super::{CoingeckoSource, TokenDirectory};

const PROBE_SLIPPAGE_BPS: u16 = 100;

/// Derives a token's USD price from a 1 SOL probe quote against the
/// aggregator, then converts through the SOL/USD rate. Last in the provider
/// chain: it costs a quote round-trip, but it works for any token with a
/// live market.
pub struct DexQuoteSource {
    dex: Arc<dyn DexPort>,
    directory: Arc<TokenDirectory>,
    coingecko: Arc<CoingeckoSource>,
}

impl DexQuoteSource {
    pub fn new(
        dex: Arc<dyn DexPort>,
        directory: Arc<TokenDirectory>,
        coingecko: Arc<CoingeckoSource>,
    ) -> Self {
        Self {
            dex,
            directory,
            coingecko,
        }
    }
}

#[async_trait]
impl PriceSource for DexQuoteSource {
    fn name(&self) -> &'static str {
        "jupiter"
    }

    async fn usd_price(&self, token_address: &str) -> Option<f64> {
        // A SOL-denominated probe cannot price SOL itself.
        if token_address == SOL_MINT {
            return None;
        }

        let request = QuoteRequest::new(
            SOL_MINT,
            token_address,
            LAMPORTS_PER_SOL,
            PROBE_SLIPPAGE_BPS,
        );
        let quote = self.dex.get_quote(&request).await?;
        let out_amount = quote.output_amount();
        if out_amount == 0 {
            warn!(token = %token_address, "probe quote returned zero output");
            return None;
        }

        let decimals = match self.directory.token_by_address(token_address).await {
            Ok(info) => info.decimals,
            Err(err) => {
                debug!(token = %token_address, error = %err, "decimals lookup failed, assuming 9");
                9
            }
        };

        let tokens_per_sol = out_amount as f64 / 10f64.powi(decimals as i32);
        let price_in_sol = 1.0 / tokens_per_sol;
        let sol_usd = self
            .coingecko
            .sol_usd()
            .await
            .unwrap_or(DEFAULT_SOL_PRICE_USD);
        Some(price_in_sol * sol_usd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::jupiter::QuoteResponse;
    use crate::ports::dex::MockDexPort;
    use approx::assert_relative_eq;

    fn probe_quote(out_amount: &str) -> QuoteResponse {
        serde_json::from_value(serde_json::json!({
            "inputMint": SOL_MINT,
            "inAmount": "1000000000",
            "outputMint": "Mint111",
            "outAmount": out_amount,
            "otherAmountThreshold": out_amount,
            "swapMode": "ExactIn",
            "slippageBps": 100,
            "priceImpactPct": "0.01",
            "routePlan": []
        }))
        .expect("probe quote json must parse")
    }

    fn dead_directory() -> Arc<TokenDirectory> {
        Arc::new(TokenDirectory::new("http://127.0.0.1:9").unwrap())
    }

    fn dead_coingecko() -> Arc<CoingeckoSource> {
        Arc::new(CoingeckoSource::new("http://127.0.0.1:9").unwrap())
    }

    #[tokio::test]
    async fn test_price_derived_from_probe_quote() {
        let mut dex = MockDexPort::new();
        dex.expect_get_quote()
            .times(1)
            .returning(|_| Some(probe_quote("9000000000")));
        let source = DexQuoteSource::new(Arc::new(dex), dead_directory(), dead_coingecko());

        // 1 SOL buys 9 tokens; SOL/USD falls back to 100, so 100 / 9 each.
        let price = source.usd_price("Mint111").await.unwrap();
        assert_relative_eq!(price, 100.0 / 9.0, epsilon = 1e-9);
    }

    #[tokio::test]
    async fn test_sol_itself_is_not_priced() {
        let dex = MockDexPort::new();
        let source = DexQuoteSource::new(Arc::new(dex), dead_directory(), dead_coingecko());
        assert_eq!(source.usd_price(SOL_MINT).await, None);
    }

    #[tokio::test]
    async fn test_zero_output_probe_is_rejected() {
        let mut dex = MockDexPort::new();
        dex.expect_get_quote().returning(|_| Some(probe_quote("0")));
        let source = DexQuoteSource::new(Arc::new(dex), dead_directory(), dead_coingecko());
        assert_eq!(source.usd_price("Mint111").await, None);
    }

    #[tokio::test]
    async fn test_missing_quote_is_none() {
        let mut dex = MockDexPort::new();
        dex.expect_get_quote().returning(|_| None);
        let source = DexQuoteSource::new(Arc::new(dex), dead_directory(), dead_coingecko());
        assert_eq!(source.usd_price("Mint111").await, None);
    }

    #[tokio::test]
    async fn test_probe_request_shape() {
        let mut dex = MockDexPort::new();
        dex.expect_get_quote()
            .withf(|request| {
                request.input_mint == SOL_MINT
                    && request.output_mint == "Mint111"
                    && request.amount == LAMPORTS_PER_SOL
                    && request.slippage_bps == PROBE_SLIPPAGE_BPS
            })
            .returning(|_| None);
        let source = DexQuoteSource::new(Arc::new(dex), dead_directory(), dead_coingecko());
        let _ = source.usd_price("Mint111").await;
    }
}
