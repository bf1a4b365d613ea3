//! Market data: token metadata and USD prices with a TTL cache in front.
//!
//! Lookups are total. Unknown tokens come back as placeholders and missing
//! prices as `None`; display paths never fail because a provider is down.

pub mod cache;
pub mod service;

pub use cache::CacheEntry;
pub use service::MarketService;

use serde::{Deserialize, Serialize};

/// Assumed when every provider fails to price SOL.
pub const DEFAULT_SOL_PRICE_USD: f64 = 100.0;

/// Token metadata as served by the Jupiter token directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub address: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    #[serde(rename = "logoURI", default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl TokenInfo {
    /// Stand-in for tokens the directory does not know. Decimals default to
    /// 9, the most common mint precision. Placeholders are never cached.
    pub fn placeholder(address: &str) -> Self {
        Self {
            address: address.to_string(),
            symbol: "UNKNOWN".to_string(),
            name: "Unknown Token".to_string(),
            decimals: 9,
            logo_uri: None,
            tags: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_has_documented_shape() {
        let info = TokenInfo::placeholder("Mint111");
        assert_eq!(info.address, "Mint111");
        assert_eq!(info.symbol, "UNKNOWN");
        assert_eq!(info.name, "Unknown Token");
        assert_eq!(info.decimals, 9);
    }

    #[test]
    fn deserializes_directory_payload() {
        let json = r#"{
            "address": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
            "chainId": 101,
            "decimals": 6,
            "name": "USD Coin",
            "symbol": "USDC",
            "logoURI": "https://example.org/usdc.png",
            "tags": ["verified"]
        }"#;
        let info: TokenInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.symbol, "USDC");
        assert_eq!(info.decimals, 6);
        assert_eq!(info.logo_uri.as_deref(), Some("https://example.org/usdc.png"));
        assert_eq!(info.tags, vec!["verified"]);
    }
}
