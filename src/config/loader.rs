//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config.toml
//! structure. Secrets (API keys) come from the environment, not the file.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub solana: SolanaSection,
    #[serde(default)]
    pub jupiter: JupiterSection,
    #[serde(default)]
    pub market: MarketSection,
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Solana RPC configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct SolanaSection {
    /// RPC endpoint (use a private RPC for production)
    pub rpc_url: String,
    /// Cluster: "mainnet", "mainnet-beta" or "devnet"
    pub network: String,
}

impl Default for SolanaSection {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            network: "mainnet".to_string(),
        }
    }
}

impl SolanaSection {
    /// RPC URL with environment variable override (`SOLANA_RPC_URL`).
    pub fn get_rpc_url(&self) -> String {
        std::env::var("SOLANA_RPC_URL").unwrap_or_else(|_| self.rpc_url.clone())
    }
}

/// Jupiter API configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct JupiterSection {
    /// Jupiter V6 API base URL
    pub api_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retry attempts for quote/swap calls
    pub max_retries: u32,
}

impl Default for JupiterSection {
    fn default() -> Self {
        Self {
            api_url: "https://quote-api.jup.ag/v6".to_string(),
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

impl JupiterSection {
    /// API URL with environment variable override (`JUPITER_API_URL`).
    pub fn get_api_url(&self) -> String {
        std::env::var("JUPITER_API_URL").unwrap_or_else(|_| self.api_url.clone())
    }

    /// Optional API key for higher rate limits; environment only
    /// (`JUPITER_API_KEY`), never the config file.
    pub fn get_api_key(&self) -> Option<String> {
        std::env::var("JUPITER_API_KEY").ok().filter(|k| !k.is_empty())
    }
}

/// Market data configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct MarketSection {
    /// Verified token directory base URL
    pub token_directory_url: String,
    /// CoinGecko API base URL
    pub coingecko_url: String,
    /// Birdeye API base URL
    pub birdeye_url: String,
    /// TTL for token metadata and price caches, in seconds
    pub cache_ttl_secs: u64,
}

impl Default for MarketSection {
    fn default() -> Self {
        Self {
            token_directory_url: "https://tokens.jup.ag".to_string(),
            coingecko_url: "https://api.coingecko.com/api/v3".to_string(),
            birdeye_url: "https://public-api.birdeye.so".to_string(),
            cache_ttl_secs: 60,
        }
    }
}

impl MarketSection {
    /// Birdeye API key; environment only (`BIRDEYE_API_KEY`). Without it the
    /// Birdeye source reports unavailable and the chain falls through.
    pub fn get_birdeye_api_key(&self) -> Option<String> {
        std::env::var("BIRDEYE_API_KEY").ok().filter(|k| !k.is_empty())
    }
}

/// Trade engine configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    /// Interval between confirmation polls, in milliseconds
    pub confirm_poll_interval_ms: u64,
    /// Polls before the confirmation window closes
    pub confirm_max_polls: u32,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            confirm_poll_interval_ms: 2_000,
            confirm_max_polls: 15,
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Load from the file when it exists, otherwise the documented defaults.
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    if path.as_ref().exists() {
        load_config(path)
    } else {
        tracing::warn!(
            path = %path.as_ref().display(),
            "config file not found, using defaults"
        );
        Ok(Config::default())
    }
}

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if crate::adapters::solana::Network::parse(&self.solana.network).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "network must be mainnet, mainnet-beta or devnet, got '{}'",
                self.solana.network
            )));
        }

        if self.solana.rpc_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "rpc_url must not be empty".to_string(),
            ));
        }

        if self.jupiter.api_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "jupiter api_url must not be empty".to_string(),
            ));
        }

        if self.jupiter.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "jupiter timeout_secs must be > 0".to_string(),
            ));
        }

        if self.market.cache_ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "cache_ttl_secs must be > 0".to_string(),
            ));
        }

        if self.engine.confirm_max_polls == 0 {
            return Err(ConfigError::ValidationError(
                "confirm_max_polls must be > 0".to_string(),
            ));
        }

        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "level must be one of {:?}, got '{}'",
                VALID_LOG_LEVELS, self.logging.level
            )));
        }

        Ok(())
    }
}
