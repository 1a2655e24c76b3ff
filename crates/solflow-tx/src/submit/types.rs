//! Shared submission types, errors, and the connection transport.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use serde::Deserialize;
use solana_commitment_config::CommitmentLevel;
use solana_hash::Hash;
use solana_transaction::versioned::VersionedTransaction;
use thiserror::Error;

use crate::signature::SignatureError;

/// Default interval between rebroadcasts of a pending transaction.
pub const DEFAULT_RESEND_INTERVAL: Duration = Duration::from_secs(2);
/// Default interval between direct signature status polls.
pub const DEFAULT_STATUS_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Default number of blocks shaved off the blockhash validity window.
pub const DEFAULT_BLOCK_HEIGHT_SAFETY_MARGIN: u64 = 150;
/// Default number of transaction record fetch attempts.
pub const DEFAULT_RECORD_FETCH_ATTEMPTS: u32 = 5;
/// Default initial backoff between record fetch attempts.
pub const DEFAULT_RECORD_FETCH_BACKOFF: Duration = Duration::from_secs(1);

/// Signed transaction ready for submission.
///
/// Holds the transaction alongside its serialized bytes so rebroadcasts reuse
/// one encoding.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SignedTx {
    transaction: VersionedTransaction,
    bytes: Vec<u8>,
}

impl SignedTx {
    /// Serializes a signed transaction into its submission payload.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::SerializeTransaction`] when encoding fails.
    pub fn new(transaction: VersionedTransaction) -> Result<Self, SubmitError> {
        let bytes = bincode::serialize(&transaction)
            .map_err(|source| SubmitError::SerializeTransaction { source })?;
        Ok(Self { transaction, bytes })
    }

    /// Returns the signed transaction.
    #[must_use]
    pub fn transaction(&self) -> &VersionedTransaction {
        &self.transaction
    }

    /// Returns the serialized transaction bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Blockhash validity window attached to a transaction.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct BlockhashExpiry {
    /// Recent blockhash embedded in the transaction message.
    pub blockhash: Hash,
    /// Last block height at which the blockhash is still valid.
    pub last_valid_block_height: u64,
}

impl BlockhashExpiry {
    /// Returns a copy whose validity window ends `margin` blocks earlier.
    ///
    /// The network keeps accepting the transaction up to the full window, so
    /// giving up early leaves room for a late landing that the record fetch
    /// still picks up.
    #[must_use]
    pub fn with_safety_margin(&self, margin: u64) -> Self {
        Self {
            blockhash: self.blockhash,
            last_valid_block_height: self.last_valid_block_height.saturating_sub(margin),
        }
    }
}

/// Shared cancellation flag linking the submission tasks.
///
/// Clones observe the same flag. Cancelling is idempotent.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    inner: Arc<AtomicBool>,
}

impl CancelFlag {
    /// Creates an unset flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the flag; returns true only for the call that flipped it.
    pub fn cancel(&self) -> bool {
        !self.inner.swap(true, Ordering::SeqCst)
    }

    /// Returns true once the flag has been set.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }
}

/// Cluster-reported status for a submitted signature.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureStatus {
    /// Slot in which the transaction was processed.
    pub slot: u64,
    /// Cluster confirmation count, absent once rooted.
    pub confirmations: Option<u64>,
    /// Processing error when the transaction failed on chain.
    pub err: Option<serde_json::Value>,
    /// Highest commitment the transaction has reached.
    pub confirmation_status: Option<CommitmentLevel>,
}

impl SignatureStatus {
    /// Returns true when the reported commitment is at or above `level`.
    #[must_use]
    pub fn meets_commitment(&self, level: CommitmentLevel) -> bool {
        self.confirmation_status
            .is_some_and(|status| commitment_rank(status) >= commitment_rank(level))
    }
}

fn commitment_rank(level: CommitmentLevel) -> u8 {
    match level {
        CommitmentLevel::Processed => 0,
        CommitmentLevel::Confirmed => 1,
        CommitmentLevel::Finalized => 2,
    }
}

/// Outcome of the confirmation race.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ConfirmationOutcome {
    /// The signature reached at least confirmed commitment.
    Confirmed(SignatureStatus),
    /// The shortened validity window closed without an observed confirmation.
    ///
    /// Not a failure: the transaction may still land within the remaining
    /// window, so callers proceed to the record fetch.
    ExpiredWithoutConfirmation,
}

/// Settled transaction record returned by the ledger.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Slot containing the transaction.
    pub slot: u64,
    /// Estimated production time of the containing block, unix seconds.
    pub block_time: Option<i64>,
    /// Execution metadata.
    pub meta: Option<TransactionRecordMeta>,
}

/// Execution metadata attached to a transaction record.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct TransactionRecordMeta {
    /// Processing error when the transaction failed on chain.
    pub err: Option<serde_json::Value>,
}

/// Result of simulating a transaction against current cluster state.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct SimulationResult {
    /// Simulation error when execution would fail.
    pub err: Option<serde_json::Value>,
    /// Program log output captured during simulation.
    pub logs: Option<Vec<String>>,
}

/// Send tuning.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SendTransactionConfig {
    /// Skip preflight simulation when true.
    pub skip_preflight: bool,
    /// Optional preflight commitment.
    pub preflight_commitment: Option<CommitmentLevel>,
}

impl Default for SendTransactionConfig {
    fn default() -> Self {
        Self {
            skip_preflight: true,
            preflight_commitment: None,
        }
    }
}

/// Signature status query tuning.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct SignatureStatusConfig {
    /// Search the full ledger instead of the recent status cache.
    pub search_transaction_history: bool,
}

/// Transaction record fetch tuning.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct TransactionFetchConfig {
    /// Commitment the record must satisfy.
    pub commitment: CommitmentLevel,
    /// Highest transaction version the caller can decode.
    pub max_supported_transaction_version: u8,
}

impl Default for TransactionFetchConfig {
    fn default() -> Self {
        Self {
            commitment: CommitmentLevel::Confirmed,
            max_supported_transaction_version: 0,
        }
    }
}

/// Simulation tuning.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SimulateTransactionConfig {
    /// Replace the message blockhash with the latest one before simulating.
    pub replace_recent_blockhash: bool,
    /// Commitment of the bank state to simulate against.
    pub commitment: CommitmentLevel,
}

impl Default for SimulateTransactionConfig {
    fn default() -> Self {
        Self {
            replace_recent_blockhash: true,
            commitment: CommitmentLevel::Processed,
        }
    }
}

/// Connection-level errors surfaced by RPC transports.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// HTTP client construction failed.
    #[error("failed to build rpc http client: {source}")]
    BuildClient {
        /// Client builder error.
        source: reqwest::Error,
    },
    /// Request failed before producing an HTTP response.
    #[error("rpc request failed for method `{method}`: {source}")]
    Request {
        /// JSON-RPC method name.
        method: &'static str,
        /// Transport error.
        source: reqwest::Error,
    },
    /// Server answered with a non-success HTTP status.
    #[error("rpc method `{method}` failed with status {status}: {source}")]
    HttpStatus {
        /// JSON-RPC method name.
        method: &'static str,
        /// HTTP status code.
        status: reqwest::StatusCode,
        /// Status error.
        source: reqwest::Error,
    },
    /// Response body was not valid JSON-RPC.
    #[error("rpc method `{method}` returned invalid json: {source}")]
    InvalidJson {
        /// JSON-RPC method name.
        method: &'static str,
        /// Decode error.
        source: reqwest::Error,
    },
    /// Result payload did not match the expected shape.
    #[error("rpc method `{method}` returned an invalid result: {source}")]
    InvalidResult {
        /// JSON-RPC method name.
        method: &'static str,
        /// Decode error.
        source: serde_json::Error,
    },
    /// Server returned a JSON-RPC error object.
    #[error("rpc method `{method}` error {code}: {message}")]
    RpcMethod {
        /// JSON-RPC method name.
        method: &'static str,
        /// JSON-RPC error code.
        code: i64,
        /// JSON-RPC error message.
        message: String,
    },
    /// Response carried neither a result nor an error.
    #[error("rpc method `{method}` returned neither result nor error")]
    MissingResultOrError {
        /// JSON-RPC method name.
        method: &'static str,
    },
    /// The blockhash validity window closed before confirmation.
    #[error("block height passed {last_valid_block_height} before the signature confirmed")]
    BlockhashExpired {
        /// Height bound that was exceeded.
        last_valid_block_height: u64,
    },
    /// Connection operation failed.
    #[error("connection failure: {message}")]
    Failure {
        /// Human-readable description.
        message: String,
    },
}

/// Submission-level errors.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Transaction carried no usable signature.
    #[error("cannot submit transaction: {source}")]
    Signature {
        /// Signature extraction failure.
        source: SignatureError,
    },
    /// Transaction could not be serialized for submission.
    #[error("failed to serialize signed transaction: {source}")]
    SerializeTransaction {
        /// Bincode encode error.
        source: Box<bincode::ErrorKind>,
    },
    /// Initial broadcast failed.
    #[error("failed to send transaction: {source}")]
    Send {
        /// Connection-layer failure.
        source: ConnectionError,
    },
    /// Confirmation wait failed.
    #[error("failed while waiting for confirmation: {source}")]
    Confirm {
        /// Connection-layer failure.
        source: ConnectionError,
    },
    /// Record fetch failed.
    #[error("failed to fetch transaction record: {source}")]
    FetchRecord {
        /// Connection-layer failure.
        source: ConnectionError,
    },
}

/// RPC connection interface used by the submission pipeline.
#[async_trait]
pub trait RpcConnection: Send + Sync {
    /// Broadcasts serialized transaction bytes and returns the signature string.
    async fn send_transaction(
        &self,
        tx_bytes: &[u8],
        config: &SendTransactionConfig,
    ) -> Result<String, ConnectionError>;

    /// Waits until the signature confirms or the expiry height passes.
    ///
    /// Implementations return [`ConnectionError::BlockhashExpired`] when the
    /// chain moves past `expiry.last_valid_block_height` without the signature
    /// reaching confirmed commitment.
    async fn confirm_transaction(
        &self,
        signature: &str,
        expiry: &BlockhashExpiry,
    ) -> Result<SignatureStatus, ConnectionError>;

    /// Queries the recent status cache for the signature.
    async fn get_signature_status(
        &self,
        signature: &str,
        config: &SignatureStatusConfig,
    ) -> Result<Option<SignatureStatus>, ConnectionError>;

    /// Fetches the settled transaction record, `None` when not yet visible.
    async fn get_transaction(
        &self,
        signature: &str,
        config: &TransactionFetchConfig,
    ) -> Result<Option<TransactionRecord>, ConnectionError>;

    /// Simulates serialized transaction bytes against current cluster state.
    async fn simulate_transaction(
        &self,
        tx_bytes: &[u8],
        config: &SimulateTransactionConfig,
    ) -> Result<SimulationResult, ConnectionError>;
}
