//! JSON-RPC connection implementation.

use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use solana_commitment_config::CommitmentLevel;

use super::{
    BlockhashExpiry, ConnectionError, RpcConnection, SendTransactionConfig, SignatureStatus,
    SignatureStatusConfig, SimulateTransactionConfig, SimulationResult, TransactionFetchConfig,
    TransactionRecord,
};

/// Delay between block height checks while waiting for confirmation.
const HEIGHT_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// JSON-RPC connection backed by a Solana HTTP endpoint.
#[derive(Debug, Clone)]
pub struct JsonRpcConnection {
    /// HTTP client used for RPC calls.
    client: reqwest::Client,
    /// Target JSON-RPC endpoint URL.
    rpc_url: String,
}

impl JsonRpcConnection {
    /// Creates a connection to an HTTP JSON-RPC endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::BuildClient`] when HTTP client creation fails.
    pub fn new(rpc_url: impl Into<String>) -> Result<Self, ConnectionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|source| ConnectionError::BuildClient { source })?;
        Ok(Self {
            client,
            rpc_url: rpc_url.into(),
        })
    }

    /// Returns the block height the cluster has reached at `commitment`.
    async fn get_block_height(&self, commitment: CommitmentLevel) -> Result<u64, ConnectionError> {
        self.rpc_call(
            "getBlockHeight",
            serde_json::json!([{ "commitment": commitment }]),
        )
        .await
    }

    async fn rpc_post(
        &self,
        method: &'static str,
        params: serde_json::Value,
    ) -> Result<reqwest::Response, ConnectionError> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response = self
            .client
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await
            .map_err(|source| ConnectionError::Request { method, source })?;
        let status = response.status();
        response
            .error_for_status()
            .map_err(|source| ConnectionError::HttpStatus {
                method,
                status,
                source,
            })
    }

    async fn rpc_call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: serde_json::Value,
    ) -> Result<T, ConnectionError> {
        let response = self.rpc_post(method, params).await?;
        let parsed: JsonRpcResponse<T> = response
            .json()
            .await
            .map_err(|source| ConnectionError::InvalidJson { method, source })?;
        if let Some(result) = parsed.result {
            return Ok(result);
        }
        if let Some(error) = parsed.error {
            return Err(ConnectionError::RpcMethod {
                method,
                code: error.code,
                message: error.message,
            });
        }
        Err(ConnectionError::MissingResultOrError { method })
    }

    /// Like [`Self::rpc_call`] for methods whose result may legitimately be
    /// JSON `null`, which maps to `Ok(None)` instead of an error.
    async fn rpc_call_nullable<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: serde_json::Value,
    ) -> Result<Option<T>, ConnectionError> {
        let response = self.rpc_post(method, params).await?;
        let parsed: JsonRpcNullableResponse = response
            .json()
            .await
            .map_err(|source| ConnectionError::InvalidJson { method, source })?;
        if let Some(error) = parsed.error {
            return Err(ConnectionError::RpcMethod {
                method,
                code: error.code,
                message: error.message,
            });
        }
        if parsed.result.is_null() {
            return Ok(None);
        }
        serde_json::from_value(parsed.result)
            .map(Some)
            .map_err(|source| ConnectionError::InvalidResult { method, source })
    }
}

/// JSON-RPC envelope.
#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    /// Result value for successful calls.
    result: Option<T>,
    /// Error payload for failed calls.
    error: Option<JsonRpcError>,
}

/// JSON-RPC envelope for methods whose result may be `null`.
#[derive(Debug, Deserialize)]
struct JsonRpcNullableResponse {
    /// Raw result value, `Null` when absent.
    #[serde(default)]
    result: serde_json::Value,
    /// Error payload for failed calls.
    error: Option<JsonRpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Deserialize)]
struct JsonRpcError {
    /// JSON-RPC error code.
    code: i64,
    /// Human-readable message.
    message: String,
}

/// Envelope for RPC results that carry a slot context.
#[derive(Debug, Deserialize)]
struct WithContext<T> {
    /// Result value.
    value: T,
}

#[async_trait]
impl RpcConnection for JsonRpcConnection {
    async fn send_transaction(
        &self,
        tx_bytes: &[u8],
        config: &SendTransactionConfig,
    ) -> Result<String, ConnectionError> {
        #[derive(Debug, Serialize)]
        struct SendConfig<'config> {
            /// Transaction encoding format.
            encoding: &'config str,
            /// Preflight skip flag.
            #[serde(rename = "skipPreflight")]
            skip_preflight: bool,
            /// Optional preflight commitment.
            #[serde(
                rename = "preflightCommitment",
                skip_serializing_if = "Option::is_none"
            )]
            preflight_commitment: Option<CommitmentLevel>,
        }

        let encoded_tx = BASE64_STANDARD.encode(tx_bytes);
        self.rpc_call(
            "sendTransaction",
            serde_json::json!([
                encoded_tx,
                SendConfig {
                    encoding: "base64",
                    skip_preflight: config.skip_preflight,
                    preflight_commitment: config.preflight_commitment,
                }
            ]),
        )
        .await
    }

    async fn confirm_transaction(
        &self,
        signature: &str,
        expiry: &BlockhashExpiry,
    ) -> Result<SignatureStatus, ConnectionError> {
        loop {
            if let Some(status) = self
                .get_signature_status(signature, &SignatureStatusConfig::default())
                .await?
                && status.meets_commitment(CommitmentLevel::Confirmed)
            {
                return Ok(status);
            }
            let height = self.get_block_height(CommitmentLevel::Confirmed).await?;
            if height > expiry.last_valid_block_height {
                return Err(ConnectionError::BlockhashExpired {
                    last_valid_block_height: expiry.last_valid_block_height,
                });
            }
            tokio::time::sleep(HEIGHT_CHECK_INTERVAL).await;
        }
    }

    async fn get_signature_status(
        &self,
        signature: &str,
        config: &SignatureStatusConfig,
    ) -> Result<Option<SignatureStatus>, ConnectionError> {
        let response: WithContext<Vec<Option<SignatureStatus>>> = self
            .rpc_call(
                "getSignatureStatuses",
                serde_json::json!([
                    [signature],
                    { "searchTransactionHistory": config.search_transaction_history }
                ]),
            )
            .await?;
        Ok(response.value.into_iter().next().flatten())
    }

    async fn get_transaction(
        &self,
        signature: &str,
        config: &TransactionFetchConfig,
    ) -> Result<Option<TransactionRecord>, ConnectionError> {
        self.rpc_call_nullable(
            "getTransaction",
            serde_json::json!([
                signature,
                {
                    "commitment": config.commitment,
                    "maxSupportedTransactionVersion": config.max_supported_transaction_version,
                }
            ]),
        )
        .await
    }

    async fn simulate_transaction(
        &self,
        tx_bytes: &[u8],
        config: &SimulateTransactionConfig,
    ) -> Result<SimulationResult, ConnectionError> {
        #[derive(Debug, Serialize)]
        struct SimulateConfig<'config> {
            /// Transaction encoding format.
            encoding: &'config str,
            /// Replace the message blockhash before simulating.
            #[serde(rename = "replaceRecentBlockhash")]
            replace_recent_blockhash: bool,
            /// Bank commitment to simulate against.
            commitment: CommitmentLevel,
        }

        let encoded_tx = BASE64_STANDARD.encode(tx_bytes);
        let response: WithContext<SimulationResult> = self
            .rpc_call(
                "simulateTransaction",
                serde_json::json!([
                    encoded_tx,
                    SimulateConfig {
                        encoding: "base64",
                        replace_recent_blockhash: config.replace_recent_blockhash,
                        commitment: config.commitment,
                    }
                ]),
            )
            .await?;
        Ok(response.value)
    }
}
