use async_trait::async_trait;

use crate::adapters::jupiter::{QuoteRequest, QuoteResponse, SwapResponse};

/// Everything a swap needs, resolved up front by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapParams {
    pub input_mint: String,
    pub output_mint: String,
    /// Raw units of the input mint.
    pub amount: u64,
    pub slippage_bps: u16,
    /// Base58-encoded 64-byte secret key of the signing wallet.
    pub signer_key: String,
}

/// Result of a swap attempt. Success means the transaction was accepted by
/// the RPC node, not that it confirmed; confirmation is polled separately.
#[derive(Debug, Clone)]
pub struct SwapOutcome {
    pub success: bool,
    pub signature: Option<String>,
    pub error: Option<String>,
    /// The quote the attempt was built from, when one was obtained.
    pub quote: Option<QuoteResponse>,
}

impl SwapOutcome {
    pub fn ok(signature: String, quote: QuoteResponse) -> Self {
        Self {
            success: true,
            signature: Some(signature),
            error: None,
            quote: Some(quote),
        }
    }

    pub fn fail(error: impl Into<String>, quote: Option<QuoteResponse>) -> Self {
        Self {
            success: false,
            signature: None,
            error: Some(error.into()),
            quote,
        }
    }
}

/// DEX aggregator boundary: quoting, swap transaction assembly, and the full
/// quote-sign-submit pipeline.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DexPort: Send + Sync {
    /// Best route for the request, or `None` when the aggregator has none
    /// (unknown mint, no liquidity, transport failure).
    async fn get_quote(&self, request: &QuoteRequest) -> Option<QuoteResponse>;

    /// Unsigned swap transaction for a previously obtained quote.
    async fn get_swap_transaction(
        &self,
        quote: &QuoteResponse,
        user_public_key: &str,
    ) -> Option<SwapResponse>;

    /// Quote, guard, sign and submit in one step. Total: failures are folded
    /// into the outcome rather than raised.
    async fn execute_swap(&self, params: SwapParams) -> SwapOutcome;
}
