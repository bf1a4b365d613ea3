//! Jupiter Adapter
//!
//! Implementation of the DexPort for the Jupiter V6 aggregator.
//! Handles quote fetching, swap building, signing and submission.

mod client;
mod quote;
mod swap;

pub use client::{JupiterClient, JupiterConfig, JupiterError};
pub use quote::{QuoteRequest, QuoteResponse, RoutePlanStep, SwapInfo};
pub use swap::{SwapRequest, SwapResponse};
