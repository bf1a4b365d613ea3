//! Jupiter Quote Types
//!
//! Request and response structures for Jupiter V6 quote API.

use serde::{Deserialize, Serialize};

/// Request parameters for getting a swap quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    /// Input token mint address
    pub input_mint: String,
    /// Output token mint address
    pub output_mint: String,
    /// Amount in base units (lamports for SOL)
    pub amount: u64,
    /// Slippage tolerance in basis points (1 = 0.01%)
    pub slippage_bps: u16,
    /// Only use direct routes (no intermediate tokens)
    #[serde(default)]
    pub only_direct_routes: bool,
}

impl QuoteRequest {
    pub fn new(
        input_mint: impl Into<String>,
        output_mint: impl Into<String>,
        amount: u64,
        slippage_bps: u16,
    ) -> Self {
        Self {
            input_mint: input_mint.into(),
            output_mint: output_mint.into(),
            amount,
            slippage_bps,
            only_direct_routes: false,
        }
    }

    pub fn with_direct_routes(mut self, direct: bool) -> Self {
        self.only_direct_routes = direct;
        self
    }
}

/// Response from Jupiter quote API. Passed back verbatim to the swap
/// endpoint, so unknown fields are preserved via `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    /// Input token mint address
    pub input_mint: String,
    /// Output token mint address
    pub output_mint: String,
    /// Input amount in base units
    pub in_amount: String,
    /// Output amount in base units
    pub out_amount: String,
    /// Minimum output amount after slippage (otherAmountThreshold)
    pub other_amount_threshold: String,
    /// Swap mode (ExactIn or ExactOut)
    pub swap_mode: String,
    /// Slippage in basis points
    pub slippage_bps: u16,
    /// Price impact percentage (as string)
    #[serde(default)]
    pub price_impact_pct: String,
    /// Route plan with swap details
    pub route_plan: Vec<RoutePlanStep>,
    /// Context slot for the quote
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_slot: Option<u64>,
    /// Time taken in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_taken: Option<f64>,
    /// Catch-all for any additional fields from API (prevents future field loss)
    #[serde(flatten)]
    pub extra: std::collections::HashMap<String, serde_json::Value>,
}

impl QuoteResponse {
    /// Get input amount as u64
    pub fn input_amount(&self) -> u64 {
        self.in_amount.parse().unwrap_or(0)
    }

    /// Get output amount as u64
    pub fn output_amount(&self) -> u64 {
        self.out_amount.parse().unwrap_or(0)
    }

    /// Get minimum output amount as u64
    pub fn min_output_amount(&self) -> u64 {
        self.other_amount_threshold.parse().unwrap_or(0)
    }

    /// Get price impact as f64 percentage
    pub fn price_impact(&self) -> f64 {
        self.price_impact_pct.parse().unwrap_or(0.0)
    }

    /// DEX labels along the route, for logging.
    pub fn route_labels(&self) -> Vec<&str> {
        self.route_plan
            .iter()
            .map(|step| step.swap_info.label.as_str())
            .collect()
    }
}

/// A step in the route plan
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlanStep {
    /// Swap information for this step
    pub swap_info: SwapInfo,
    /// Percentage of the trade going through this route
    pub percent: u8,
}

/// Information about a single swap in the route
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapInfo {
    /// AMM key (pool identifier)
    pub amm_key: String,
    /// Label for the DEX (e.g., "Raydium", "Orca")
    pub label: String,
    /// Input mint for this hop
    pub input_mint: String,
    /// Output mint for this hop
    pub output_mint: String,
    /// Input amount for this hop
    pub in_amount: String,
    /// Output amount for this hop
    pub out_amount: String,
    /// Fee amount charged (not always returned by the API)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_amount: Option<String>,
    /// Fee mint token (not always returned by the API)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_mint: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_request_new() {
        let req = QuoteRequest::new(
            "So11111111111111111111111111111111111111112".to_string(),
            "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".to_string(),
            50_000_000, // 0.05 SOL
            100,        // 1%
        );

        assert_eq!(req.amount, 50_000_000);
        assert_eq!(req.slippage_bps, 100);
        assert!(!req.only_direct_routes);
    }

    #[test]
    fn test_quote_response_parsing() {
        let json = r#"{
            "inputMint": "So11111111111111111111111111111111111111112",
            "outputMint": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
            "inAmount": "50000000",
            "outAmount": "9000000",
            "otherAmountThreshold": "8910000",
            "swapMode": "ExactIn",
            "slippageBps": 100,
            "priceImpactPct": "0.02",
            "routePlan": [{
                "swapInfo": {
                    "ammKey": "pool123",
                    "label": "Raydium",
                    "inputMint": "So11111111111111111111111111111111111111112",
                    "outputMint": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
                    "inAmount": "50000000",
                    "outAmount": "9000000",
                    "feeAmount": "1500",
                    "feeMint": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"
                },
                "percent": 100
            }]
        }"#;

        let quote: QuoteResponse = serde_json::from_str(json).unwrap();
        assert_eq!(quote.input_amount(), 50_000_000);
        assert_eq!(quote.output_amount(), 9_000_000);
        assert_eq!(quote.min_output_amount(), 8_910_000);
        assert!((quote.price_impact() - 0.02).abs() < 1e-9);
        assert_eq!(quote.route_labels(), vec!["Raydium"]);
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let json = r#"{
            "inputMint": "A",
            "outputMint": "B",
            "inAmount": "1",
            "outAmount": "2",
            "otherAmountThreshold": "2",
            "swapMode": "ExactIn",
            "slippageBps": 50,
            "priceImpactPct": "0",
            "routePlan": [],
            "platformFee": null,
            "someFutureField": {"nested": true}
        }"#;

        let quote: QuoteResponse = serde_json::from_str(json).unwrap();
        assert!(quote.extra.contains_key("someFutureField"));

        // Fields the struct does not model must still reach the swap endpoint.
        let value = serde_json::to_value(&quote).unwrap();
        assert_eq!(value["someFutureField"]["nested"], true);
    }

    #[test]
    fn test_missing_price_impact_defaults_to_zero() {
        let json = r#"{
            "inputMint": "A",
            "outputMint": "B",
            "inAmount": "1",
            "outAmount": "2",
            "otherAmountThreshold": "2",
            "swapMode": "ExactIn",
            "slippageBps": 50,
            "routePlan": []
        }"#;

        let quote: QuoteResponse = serde_json::from_str(json).unwrap();
        assert_eq!(quote.price_impact(), 0.0);
    }
}
