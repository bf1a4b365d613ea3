//! Jupiter Swap Types
//!
//! Request and response structures for Jupiter V6 swap API.

use serde::{Deserialize, Serialize};

use super::quote::QuoteResponse;

/// Request parameters for building a swap transaction.
///
/// The quote goes back typed rather than as raw JSON; `QuoteResponse`
/// flattens unmodeled fields so nothing the quote endpoint returned is lost.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    /// The full quote response from the /quote endpoint
    pub quote_response: QuoteResponse,
    /// User's public key (wallet address)
    pub user_public_key: String,
    /// Wrap and unwrap SOL automatically around the swap
    pub wrap_and_unwrap_sol: bool,
    /// Whether to use dynamic compute unit limit calculation
    pub dynamic_compute_unit_limit: bool,
    /// Either the string "auto" or a lamport number
    pub prioritization_fee_lamports: serde_json::Value,
}

impl SwapRequest {
    /// Create a new swap request with the defaults the engine sends:
    /// SOL wrapping on, dynamic compute limit on, priority fee "auto".
    pub fn new(quote_response: QuoteResponse, user_public_key: String) -> Self {
        Self {
            quote_response,
            user_public_key,
            wrap_and_unwrap_sol: true,
            dynamic_compute_unit_limit: true,
            prioritization_fee_lamports: serde_json::json!("auto"),
        }
    }

    /// Pin the priority fee to an explicit lamport amount.
    pub fn with_priority_fee(mut self, lamports: u64) -> Self {
        self.prioritization_fee_lamports = serde_json::json!(lamports);
        self
    }
}

/// Response from Jupiter swap API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapResponse {
    /// Base64 encoded serialized transaction ready to sign and send
    pub swap_transaction: String,
    /// Last valid block height for this transaction
    pub last_valid_block_height: u64,
    /// Prioritization fee applied (in lamports)
    #[serde(default)]
    pub prioritization_fee_lamports: u64,
    /// Compute unit limit chosen by the API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_unit_limit: Option<u64>,
    /// Present when the API simulated the transaction and it failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulation_error: Option<serde_json::Value>,
    /// Catch-all for any additional fields from API
    #[serde(flatten)]
    pub extra: std::collections::HashMap<String, serde_json::Value>,
}

impl SwapResponse {
    /// Get the transaction bytes from base64
    pub fn transaction_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.decode(&self.swap_transaction)
    }

    /// Check if transaction is still valid based on current block height
    pub fn is_valid_at_height(&self, current_height: u64) -> bool {
        current_height <= self.last_valid_block_height
    }
}
