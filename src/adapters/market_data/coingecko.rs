use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

use crate::domain::SOL_MINT;
use crate::ports::PriceSource;

use super::MarketError;

/// CoinGecko simple-price API. Keyless, so always available; SOL itself is
/// priced through the `solana` coin id rather than the token-price endpoint.
#[derive(Debug, Clone)]
pub struct CoingeckoSource {
    http: Client,
    base_url: String,
}

impl CoingeckoSource {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.coingecko.com/api/v3";

    pub fn new(base_url: impl Into<String>) -> Result<Self, MarketError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// SOL/USD from the coin id endpoint. `None` on any failure.
    pub async fn sol_usd(&self) -> Option<f64> {
        let url = format!(
            "{}/simple/price?ids=solana&vs_currencies=usd",
            self.base_url
        );
        let prices = self.fetch_price_map(&url).await?;
        prices.get("solana").and_then(|entry| entry.get("usd")).copied()
    }

    async fn fetch_price_map(&self, url: &str) -> Option<HashMap<String, HashMap<String, f64>>> {
        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "coingecko request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "coingecko returned error status");
            return None;
        }

        match response.json().await {
            Ok(map) => Some(map),
            Err(err) => {
                warn!(error = %err, "coingecko response parse failed");
                None
            }
        }
    }
}

#[async_trait]
impl PriceSource for CoingeckoSource {
    fn name(&self) -> &'static str {
        "coingecko"
    }

    async fn usd_price(&self, token_address: &str) -> Option<f64> {
        if token_address == SOL_MINT {
            return self.sol_usd().await;
        }

        let url = format!(
            "{}/simple/token_price/solana?contract_addresses={}&vs_currencies=usd",
            self.base_url, token_address
        );
        let prices = self.fetch_price_map(&url).await?;
        prices
            .get(token_address)
            .and_then(|entry| entry.get("usd"))
            .copied()
    }
}
