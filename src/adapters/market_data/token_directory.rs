use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::market::TokenInfo;
use crate::ports::TokenDirectoryPort;

use super::MarketError;

/// Jupiter token directory client. Stateless; the market service caches.
#[derive(Debug, Clone)]
pub struct TokenDirectory {
    http: Client,
    base_url: String,
}

impl TokenDirectory {
    pub const DEFAULT_BASE_URL: &'static str = "https://tokens.jup.ag";

    pub fn new(base_url: impl Into<String>) -> Result<Self, MarketError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: String) -> Result<T, MarketError> {
        let response = self.http.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl TokenDirectoryPort for TokenDirectory {
    async fn verified_tokens(&self) -> Result<Vec<TokenInfo>, MarketError> {
        self.fetch_json(format!("{}/tokens?tags=verified", self.base_url))
            .await
    }

    async fn token_by_address(&self, address: &str) -> Result<TokenInfo, MarketError> {
        self.fetch_json(format!("{}/token/{}", self.base_url, address))
            .await
    }
}
