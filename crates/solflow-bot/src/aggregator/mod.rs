//! Quote/swap aggregator HTTP client.

mod client;

pub use client::{AggregatorClient, AggregatorError, QuoteParams, QuoteResponse, SwapResponse};
