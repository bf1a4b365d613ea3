use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::domain::SOL_MINT;
use crate::ports::{PriceSource, TokenDirectoryPort};

use super::cache::CacheEntry;
use super::{TokenInfo, DEFAULT_SOL_PRICE_USD};

/// Token metadata and USD prices behind one TTL cache.
///
/// Price sources are consulted strictly in registration order. Only
/// successful lookups are cached; misses and placeholders are retried on the
/// next call.
pub struct MarketService {
    directory: Arc<dyn TokenDirectoryPort>,
    sources: Vec<Arc<dyn PriceSource>>,
    token_cache: RwLock<HashMap<String, CacheEntry<TokenInfo>>>,
    price_cache: RwLock<HashMap<String, CacheEntry<f64>>>,
    list_cache: RwLock<Option<CacheEntry<Vec<TokenInfo>>>>,
    ttl: Duration,
}

impl MarketService {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(60);
    const DEFAULT_TOP_TOKENS: usize = 20;

    pub fn new(
        directory: Arc<dyn TokenDirectoryPort>,
        sources: Vec<Arc<dyn PriceSource>>,
    ) -> Self {
        Self::with_ttl(directory, sources, Self::DEFAULT_TTL)
    }

    pub fn with_ttl(
        directory: Arc<dyn TokenDirectoryPort>,
        sources: Vec<Arc<dyn PriceSource>>,
        ttl: Duration,
    ) -> Self {
        Self {
            directory,
            sources,
            token_cache: RwLock::new(HashMap::new()),
            price_cache: RwLock::new(HashMap::new()),
            list_cache: RwLock::new(None),
            ttl,
        }
    }

    /// Metadata for a mint. Unknown or unreachable tokens come back as an
    /// uncached placeholder so the next call retries the directory.
    pub async fn token_info(&self, address: &str) -> TokenInfo {
        if let Some(entry) = self.token_cache.read().await.get(address) {
            if entry.is_valid() {
                debug!(address, "token info served from cache");
                return entry.value.clone();
            }
        }

        match self.directory.token_by_address(address).await {
            Ok(info) => {
                self.token_cache
                    .write()
                    .await
                    .insert(address.to_string(), CacheEntry::new(info.clone(), self.ttl));
                info
            }
            Err(err) => {
                warn!(address, error = %err, "token directory lookup failed");
                TokenInfo::placeholder(address)
            }
        }
    }

    /// USD price for a mint from the first provider that knows it.
    pub async fn token_price(&self, address: &str) -> Option<f64> {
        if let Some(entry) = self.price_cache.read().await.get(address) {
            if entry.is_valid() {
                debug!(address, price = entry.value, "price served from cache");
                return Some(entry.value);
            }
        }

        for source in &self.sources {
            if !source.is_available() {
                debug!(source = source.name(), "price source unavailable, skipped");
                continue;
            }
            if let Some(price) = source.usd_price(address).await {
                debug!(address, price, source = source.name(), "price resolved");
                self.price_cache
                    .write()
                    .await
                    .insert(address.to_string(), CacheEntry::new(price, self.ttl));
                return Some(price);
            }
        }

        warn!(address, "no price source could price token");
        None
    }

    /// SOL in USD, falling back to a fixed assumption when every provider
    /// fails. Display paths need a number either way.
    pub async fn sol_price(&self) -> f64 {
        self.token_price(SOL_MINT)
            .await
            .unwrap_or(DEFAULT_SOL_PRICE_USD)
    }

    /// The verified token list, cached as a whole. Empty on directory
    /// failure.
    pub async fn verified_tokens(&self) -> Vec<TokenInfo> {
        if let Some(entry) = self.list_cache.read().await.as_ref() {
            if entry.is_valid() {
                return entry.value.clone();
            }
        }

        match self.directory.verified_tokens().await {
            Ok(tokens) => {
                *self.list_cache.write().await =
                    Some(CacheEntry::new(tokens.clone(), self.ttl));
                tokens
            }
            Err(err) => {
                warn!(error = %err, "verified token list fetch failed");
                Vec::new()
            }
        }
    }

    /// First verified token whose symbol matches, case-insensitively.
    pub async fn token_by_symbol(&self, symbol: &str) -> Option<TokenInfo> {
        self.verified_tokens()
            .await
            .into_iter()
            .find(|t| t.symbol.eq_ignore_ascii_case(symbol))
    }

    /// Leading slice of the verified list. `limit` defaults to 20.
    pub async fn top_tokens(&self, limit: Option<usize>) -> Vec<TokenInfo> {
        let mut tokens = self.verified_tokens().await;
        tokens.truncate(limit.unwrap_or(Self::DEFAULT_TOP_TOKENS));
        tokens
    }

    /// Drops every cached token, price and list entry.
    pub async fn clear(&self) {
        self.token_cache.write().await.clear();
        self.price_cache.write().await.clear();
        *self.list_cache.write().await = None;
    }
}
