//! Jupiter API Client
//!
//! HTTP client for Jupiter DEX aggregator V6 API. Handles quote fetching,
//! swap transaction building, and the quote-sign-submit pipeline.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use solana_sdk::transaction::VersionedTransaction;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::adapters::solana::{WalletError, WalletManager};
use crate::domain::impact::{enforce_impact_ceiling, ImpactError};
use crate::ports::chain::{ChainPort, RpcError};
use crate::ports::dex::{DexPort, SwapOutcome, SwapParams};

use super::quote::{QuoteRequest, QuoteResponse};
use super::swap::{SwapRequest, SwapResponse};

#[derive(Debug, Error)]
pub enum JupiterError {
    #[error("API request failed: {0}")]
    Api(String),
    #[error("failed to decode swap transaction: {0}")]
    Decode(String),
    #[error(transparent)]
    Impact(#[from] ImpactError),
    #[error(transparent)]
    Wallet(#[from] WalletError),
    #[error(transparent)]
    Submission(#[from] RpcError),
}

/// Jupiter API client configuration
#[derive(Debug, Clone)]
pub struct JupiterConfig {
    /// Base URL for Jupiter API
    pub api_base_url: String,
    /// Optional API key for higher rate limits
    pub api_key: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Number of retry attempts
    pub max_retries: u32,
}

impl Default for JupiterConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://quote-api.jup.ag/v6".to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }
}

/// Jupiter DEX aggregator client.
///
/// Owns the swap pipeline end to end: quote, impact ceiling, transaction
/// build, local signing, submission through the chain port. `execute_swap`
/// returns once the node accepts the transaction; confirmation is the
/// caller's concern.
pub struct JupiterClient {
    config: JupiterConfig,
    http: Client,
    chain: Arc<dyn ChainPort>,
}

impl JupiterClient {
    pub fn new(chain: Arc<dyn ChainPort>) -> Result<Self, JupiterError> {
        Self::with_config(JupiterConfig::default(), chain)
    }

    pub fn with_config(
        config: JupiterConfig,
        chain: Arc<dyn ChainPort>,
    ) -> Result<Self, JupiterError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| JupiterError::Api(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http,
            chain,
        })
    }

    /// Get a quote for a token swap
    pub async fn fetch_quote(&self, request: &QuoteRequest) -> Result<QuoteResponse, JupiterError> {
        let url = format!("{}/quote", self.config.api_base_url);

        let mut req = self.http.get(&url).query(&[
            ("inputMint", &request.input_mint),
            ("outputMint", &request.output_mint),
            ("amount", &request.amount.to_string()),
            ("slippageBps", &request.slippage_bps.to_string()),
        ]);

        if request.only_direct_routes {
            req = req.query(&[("onlyDirectRoutes", "true")]);
        }

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("x-api-key", api_key);
        }

        let response = self
            .execute_with_retry(|| async {
                req.try_clone()
                    .ok_or_else(|| JupiterError::Api("Failed to clone request".into()))?
                    .send()
                    .await
                    .map_err(|e| JupiterError::Api(e.to_string()))
            })
            .await?;

        self.handle_response(response).await
    }

    /// Build a swap transaction for a previously fetched quote
    pub async fn fetch_swap(&self, request: &SwapRequest) -> Result<SwapResponse, JupiterError> {
        let url = format!("{}/swap", self.config.api_base_url);

        let mut req = self.http.post(&url).json(request);

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("x-api-key", api_key);
        }

        let response = self
            .execute_with_retry(|| async {
                req.try_clone()
                    .ok_or_else(|| JupiterError::Api("Failed to clone request".into()))?
                    .send()
                    .await
                    .map_err(|e| JupiterError::Api(e.to_string()))
            })
            .await?;

        self.handle_response(response).await
    }

    /// Execute request with retry logic and rate limit handling
    async fn execute_with_retry<F, Fut>(&self, request_fn: F) -> Result<reqwest::Response, JupiterError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<reqwest::Response, JupiterError>>,
    {
        let mut last_error = None;

        for attempt in 0..self.config.max_retries {
            match request_fn().await {
                Ok(response) => {
                    if response.status().is_success()
                        || response.status() == StatusCode::BAD_REQUEST
                    {
                        return Ok(response);
                    }

                    // Handle rate limiting (429) with exponential backoff
                    if response.status() == StatusCode::TOO_MANY_REQUESTS {
                        let backoff = Duration::from_secs(2u64.pow(attempt + 1)); // 2s, 4s, 8s
                        warn!(
                            "Rate limited (429), backing off for {:?} (attempt {}/{})",
                            backoff,
                            attempt + 1,
                            self.config.max_retries
                        );
                        last_error =
                            Some(JupiterError::Api("Rate limit exceeded - backing off".into()));
                        tokio::time::sleep(backoff).await;
                        continue;
                    }

                    // Retry on server errors (5xx)
                    if response.status().is_server_error() {
                        last_error = Some(JupiterError::Api(format!(
                            "Server error: {}",
                            response.status()
                        )));
                        tokio::time::sleep(Duration::from_millis(500 * (attempt as u64 + 1)))
                            .await;
                        continue;
                    }

                    return Ok(response);
                }
                Err(e) => {
                    last_error = Some(e);
                    tokio::time::sleep(Duration::from_millis(500 * (attempt as u64 + 1))).await;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| JupiterError::Api("Max retries exceeded".into())))
    }

    /// Handle API response and deserialize
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, JupiterError> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(JupiterError::Api(format!(
                "API error {}: {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| JupiterError::Api(format!("Failed to parse response: {}", e)))
    }

    /// Get the configured API base URL
    pub fn api_base_url(&self) -> &str {
        &self.config.api_base_url
    }

    async fn try_execute(&self, params: &SwapParams) -> Result<(String, QuoteResponse), (JupiterError, Option<QuoteResponse>)> {
        let wallet =
            WalletManager::from_base58(&params.signer_key).map_err(|e| (e.into(), None))?;

        let request = QuoteRequest::new(
            params.input_mint.clone(),
            params.output_mint.clone(),
            params.amount,
            params.slippage_bps,
        );
        let quote = self.fetch_quote(&request).await.map_err(|e| (e, None))?;
        info!(
            input_mint = %quote.input_mint,
            output_mint = %quote.output_mint,
            in_amount = %quote.in_amount,
            out_amount = %quote.out_amount,
            impact_pct = %quote.price_impact_pct,
            route = ?quote.route_labels(),
            "quote received"
        );

        // Hard ceiling, checked on the quote the swap will actually use.
        if let Err(e) = enforce_impact_ceiling(quote.price_impact()) {
            return Err((e.into(), Some(quote)));
        }

        let swap_request = SwapRequest::new(quote.clone(), wallet.public_key());
        let swap = match self.fetch_swap(&swap_request).await {
            Ok(swap) => swap,
            Err(e) => return Err((e, Some(quote))),
        };

        let bytes = match swap.transaction_bytes() {
            Ok(bytes) => bytes,
            Err(e) => return Err((JupiterError::Decode(e.to_string()), Some(quote))),
        };
        let unsigned: VersionedTransaction = match bincode::deserialize(&bytes) {
            Ok(tx) => tx,
            Err(e) => return Err((JupiterError::Decode(e.to_string()), Some(quote))),
        };

        let signed = match wallet.sign_versioned(unsigned) {
            Ok(tx) => tx,
            Err(e) => return Err((e.into(), Some(quote))),
        };

        match self.chain.send_transaction(&signed).await {
            Ok(signature) => Ok((signature, quote)),
            Err(e) => Err((e.into(), Some(quote))),
        }
    }
}

#[async_trait]
impl DexPort for JupiterClient {
    async fn get_quote(&self, request: &QuoteRequest) -> Option<QuoteResponse> {
        match self.fetch_quote(request).await {
            Ok(quote) => Some(quote),
            Err(err) => {
                warn!(
                    input_mint = %request.input_mint,
                    output_mint = %request.output_mint,
                    error = %err,
                    "quote fetch failed"
                );
                None
            }
        }
    }

    async fn get_swap_transaction(
        &self,
        quote: &QuoteResponse,
        user_public_key: &str,
    ) -> Option<SwapResponse> {
        let request = SwapRequest::new(quote.clone(), user_public_key.to_string());
        match self.fetch_swap(&request).await {
            Ok(swap) => Some(swap),
            Err(err) => {
                warn!(error = %err, "swap transaction build failed");
                None
            }
        }
    }

    async fn execute_swap(&self, params: SwapParams) -> SwapOutcome {
        match self.try_execute(&params).await {
            Ok((signature, quote)) => {
                info!(%signature, "swap submitted");
                SwapOutcome::ok(signature, quote)
            }
            Err((err, quote)) => {
                warn!(
                    input_mint = %params.input_mint,
                    output_mint = %params.output_mint,
                    error = %err,
                    "swap failed"
                );
                SwapOutcome::fail(err.to_string(), quote)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::chain::MockChainPort;

    fn client() -> JupiterClient {
        JupiterClient::new(Arc::new(MockChainPort::new())).unwrap()
    }

    #[test]
    fn test_jupiter_config_default() {
        let config = JupiterConfig::default();
        assert_eq!(config.api_base_url, "https://quote-api.jup.ag/v6");
        assert!(config.api_key.is_none());
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_jupiter_client_creation() {
        let client = client();
        assert_eq!(client.api_base_url(), "https://quote-api.jup.ag/v6");
    }

    #[tokio::test]
    async fn test_execute_swap_rejects_bad_signer_key() {
        let outcome = client()
            .execute_swap(SwapParams {
                input_mint: "So11111111111111111111111111111111111111112".to_string(),
                output_mint: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".to_string(),
                amount: 1_000,
                slippage_bps: 100,
                signer_key: "garbage".to_string(),
            })
            .await;

        assert!(!outcome.success);
        assert!(outcome.signature.is_none());
        assert!(outcome.quote.is_none());
        assert!(outcome
            .error
            .as_deref()
            .unwrap_or_default()
            .contains("Invalid private key"));
    }

    #[test]
    fn test_impact_error_message_survives_into_jupiter_error() {
        let err = JupiterError::from(ImpactError::TooHigh { actual: 12.5 });
        assert_eq!(
            err.to_string(),
            "High price impact: 12.50%. This swap may not be profitable."
        );
    }
}
