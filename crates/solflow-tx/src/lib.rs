#![forbid(unsafe_code)]

//! Transaction SDK for signing, submitting, and confirming Solana transactions.

/// Canonical transaction identifier extraction.
pub mod signature;
/// Signing boundary for externally built messages.
pub mod signing;
/// Submission client, confirmation waiter, and the connection transport.
pub mod submit;

pub use signature::{SignatureError, extract_transaction_signature};
pub use signing::{SigningError, sign_transaction};
pub use submit::{
    BlockhashExpiry, CancelFlag, ConfirmationOutcome, ConnectionError, JsonRpcConnection,
    RpcConnection, SendTransactionConfig, SignatureStatus, SignatureStatusConfig, SignedTx,
    SimulateTransactionConfig, SimulationResult, SubmitError, TransactionFetchConfig,
    TransactionRecord, TransactionRecordMeta, TxConfirmClient,
};
