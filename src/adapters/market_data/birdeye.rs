use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

use crate::ports::PriceSource;

use super::MarketError;

/// Birdeye price API. First in the provider chain, but only participates
/// when an API key is configured.
#[derive(Debug, Clone)]
pub struct BirdeyeSource {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl BirdeyeSource {
    pub const DEFAULT_BASE_URL: &'static str = "https://public-api.birdeye.so";

    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, MarketError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key,
        })
    }
}

#[async_trait]
impl PriceSource for BirdeyeSource {
    fn name(&self) -> &'static str {
        "birdeye"
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn usd_price(&self, token_address: &str) -> Option<f64> {
        let api_key = self.api_key.as_ref()?;
        let url = format!("{}/defi/price?address={}", self.base_url, token_address);

        let response = match self
            .http
            .get(&url)
            .header("X-API-KEY", api_key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(token_address, error = %err, "birdeye request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(
                token_address,
                status = %response.status(),
                "birdeye returned error status"
            );
            return None;
        }

        match response.json::<PriceResponse>().await {
            Ok(body) => body.data.map(|d| d.value),
            Err(err) => {
                warn!(token_address, error = %err, "birdeye response parse failed");
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct PriceResponse {
    data: Option<PriceData>,
    #[allow(dead_code)]
    #[serde(default)]
    success: bool,
}

#[derive(Debug, Deserialize)]
struct PriceData {
    value: f64,
    #[serde(rename = "updateUnixTime", default)]
    #[allow(dead_code)]
    update_unix_time: u64,
}
