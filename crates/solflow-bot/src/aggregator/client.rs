use std::time::Duration;

use serde::{Deserialize, Serialize};
use solana_pubkey::Pubkey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error("failed to build aggregator http client: {source}")]
    BuildClient { source: reqwest::Error },
    #[error("aggregator request failed for `{operation}`: {source}")]
    Request {
        operation: &'static str,
        source: reqwest::Error,
    },
    #[error("aggregator `{operation}` failed with status {status}: {source}")]
    HttpStatus {
        operation: &'static str,
        status: reqwest::StatusCode,
        source: reqwest::Error,
    },
    #[error("aggregator `{operation}` returned invalid json: {source}")]
    InvalidJson {
        operation: &'static str,
        source: reqwest::Error,
    },
}

/// Query parameters for the aggregator quote endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteParams {
    pub input_mint: String,
    pub output_mint: String,
    pub amount: u64,
    pub auto_slippage: bool,
    pub max_auto_slippage_bps: u64,
    pub only_direct_routes: bool,
    pub as_legacy_transaction: bool,
}

impl QuoteParams {
    /// Parameters for a direct swap quote with slippage capped at
    /// `max_auto_slippage_bps`.
    #[must_use]
    pub fn new(
        input_mint: impl Into<String>,
        output_mint: impl Into<String>,
        amount: u64,
        max_auto_slippage_bps: u64,
    ) -> Self {
        Self {
            input_mint: input_mint.into(),
            output_mint: output_mint.into(),
            amount,
            auto_slippage: false,
            max_auto_slippage_bps,
            only_direct_routes: false,
            as_legacy_transaction: false,
        }
    }
}

/// Aggregator quote, kept opaque and echoed back verbatim on the swap call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteResponse(serde_json::Value);

impl QuoteResponse {
    /// Quoted output amount, when the aggregator reported one.
    #[must_use]
    pub fn out_amount(&self) -> Option<&str> {
        self.0.get("outAmount").and_then(serde_json::Value::as_str)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SwapRequest<'req> {
    quote_response: &'req QuoteResponse,
    user_public_key: String,
    dynamic_compute_unit_limit: bool,
    prioritization_fee_lamports: u64,
}

/// The two fields the flow reads from the aggregator swap reply.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapResponse {
    /// Base64 serialized transaction built by the aggregator.
    pub swap_transaction: String,
    /// Last block height at which the embedded blockhash is valid.
    pub last_valid_block_height: u64,
}

/// HTTP client for the quote/swap aggregator API.
#[derive(Debug, Clone)]
pub struct AggregatorClient {
    client: reqwest::Client,
    base_url: String,
}

impl AggregatorClient {
    /// Creates a client against an aggregator base URL.
    ///
    /// # Errors
    ///
    /// Returns [`AggregatorError::BuildClient`] when the HTTP client cannot
    /// be constructed.
    pub fn new(base_url: impl Into<String>) -> Result<Self, AggregatorError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|source| AggregatorError::BuildClient { source })?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Fetches a swap quote for the configured pair.
    ///
    /// # Errors
    ///
    /// Returns an [`AggregatorError`] when the request fails or the body is
    /// not valid JSON.
    pub async fn quote(&self, params: &QuoteParams) -> Result<QuoteResponse, AggregatorError> {
        const OPERATION: &str = "quote";

        let url = format!("{}/quote", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|source| AggregatorError::Request {
                operation: OPERATION,
                source,
            })?;
        let status = response.status();
        let response =
            response
                .error_for_status()
                .map_err(|source| AggregatorError::HttpStatus {
                    operation: OPERATION,
                    status,
                    source,
                })?;
        response
            .json()
            .await
            .map_err(|source| AggregatorError::InvalidJson {
                operation: OPERATION,
                source,
            })
    }

    /// Asks the aggregator to build a swap transaction for `quote`.
    ///
    /// The quote document is embedded verbatim; the aggregator sizes compute
    /// units itself and applies `priority_fee_lamports`.
    ///
    /// # Errors
    ///
    /// Returns an [`AggregatorError`] when the request fails or the body is
    /// not valid JSON.
    pub async fn swap(
        &self,
        quote: &QuoteResponse,
        user_public_key: &Pubkey,
        priority_fee_lamports: u64,
    ) -> Result<SwapResponse, AggregatorError> {
        const OPERATION: &str = "swap";

        let url = format!("{}/swap", self.base_url);
        let request = SwapRequest {
            quote_response: quote,
            user_public_key: user_public_key.to_string(),
            dynamic_compute_unit_limit: true,
            prioritization_fee_lamports: priority_fee_lamports,
        };
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|source| AggregatorError::Request {
                operation: OPERATION,
                source,
            })?;
        let status = response.status();
        let response =
            response
                .error_for_status()
                .map_err(|source| AggregatorError::HttpStatus {
                    operation: OPERATION,
                    status,
                    source,
                })?;
        response
            .json()
            .await
            .map_err(|source| AggregatorError::InvalidJson {
                operation: OPERATION,
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_params_serialize_in_aggregator_form() {
        let params = QuoteParams::new("MintIn", "MintOut", 10_000_000, 1_000);

        let value = serde_json::to_value(&params);
        assert!(value.is_ok());
        if let Ok(value) = value {
            assert_eq!(value["inputMint"], "MintIn");
            assert_eq!(value["outputMint"], "MintOut");
            assert_eq!(value["amount"], 10_000_000);
            assert_eq!(value["autoSlippage"], false);
            assert_eq!(value["maxAutoSlippageBps"], 1_000);
            assert_eq!(value["onlyDirectRoutes"], false);
            assert_eq!(value["asLegacyTransaction"], false);
        }
    }

    #[test]
    fn quote_response_exposes_the_out_amount() {
        let quote: Result<QuoteResponse, _> =
            serde_json::from_str(r#"{"outAmount":"123456","routePlan":[{"percent":100}]}"#);
        assert!(quote.is_ok());
        if let Ok(quote) = quote {
            assert_eq!(quote.out_amount(), Some("123456"));
        }

        let empty: Result<QuoteResponse, _> = serde_json::from_str(r#"{"routePlan":[]}"#);
        assert!(empty.is_ok());
        if let Ok(empty) = empty {
            assert_eq!(empty.out_amount(), None);
        }
    }

    #[test]
    fn swap_request_embeds_the_quote_verbatim() {
        let quote: QuoteResponse = QuoteResponse(serde_json::json!({
            "outAmount": "99",
            "slippageBps": 50,
        }));
        let request = SwapRequest {
            quote_response: &quote,
            user_public_key: Pubkey::new_unique().to_string(),
            dynamic_compute_unit_limit: true,
            prioritization_fee_lamports: 100_000,
        };

        let value = serde_json::to_value(&request);
        assert!(value.is_ok());
        if let Ok(value) = value {
            assert_eq!(value["quoteResponse"]["outAmount"], "99");
            assert_eq!(value["quoteResponse"]["slippageBps"], 50);
            assert_eq!(value["dynamicComputeUnitLimit"], true);
            assert_eq!(value["prioritizationFeeLamports"], 100_000);
            assert!(value["userPublicKey"].is_string());
        }
    }

    #[test]
    fn swap_response_parses_the_aggregator_reply() {
        let response: Result<SwapResponse, _> = serde_json::from_str(
            r#"{"swapTransaction":"AQIDBA==","lastValidBlockHeight":271088441,"prioritizationFeeLamports":100000}"#,
        );
        assert!(response.is_ok());
        if let Ok(response) = response {
            assert_eq!(response.swap_transaction, "AQIDBA==");
            assert_eq!(response.last_valid_block_height, 271_088_441);
        }
    }
}
