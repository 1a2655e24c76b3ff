//! Transaction submission and confirmation.
//!
//! The submission pipeline sends a signed transaction over JSON-RPC, keeps
//! rebroadcasting it until the network settles the outcome, races a blockhash
//! scoped confirmation wait against direct status polling, and finally fetches
//! the settled transaction record.

/// Submission client orchestrating send, confirm, and fetch.
mod client;
/// Confirmation race between the scoped wait and status polling.
mod confirm;
/// Post-confirmation transaction record fetching.
mod fetch;
/// Periodic rebroadcast of the signed transaction.
mod resend;
/// JSON-RPC connection implementation.
mod rpc;
/// Shared submission types, configs, and errors.
mod types;

pub use client::TxConfirmClient;
pub use rpc::JsonRpcConnection;
pub use types::{
    BlockhashExpiry, CancelFlag, ConfirmationOutcome, ConnectionError, DEFAULT_BLOCK_HEIGHT_SAFETY_MARGIN,
    DEFAULT_RECORD_FETCH_ATTEMPTS, DEFAULT_RECORD_FETCH_BACKOFF, DEFAULT_RESEND_INTERVAL,
    DEFAULT_STATUS_POLL_INTERVAL, RpcConnection, SendTransactionConfig, SignatureStatus,
    SignatureStatusConfig, SignedTx, SimulateTransactionConfig, SimulationResult, SubmitError,
    TransactionFetchConfig, TransactionRecord, TransactionRecordMeta,
};
