//! Post-confirmation transaction record fetching.

use std::time::Duration;

use super::{ConnectionError, RpcConnection, TransactionFetchConfig, TransactionRecord};

/// Fetches the settled transaction record, retrying while the ledger has not
/// yet made it visible.
///
/// Only a `None` result triggers another attempt; connection errors propagate
/// immediately. The wait between attempts doubles from `min_backoff`, and no
/// wait follows the final attempt.
pub(super) async fn fetch_transaction_record(
    connection: &dyn RpcConnection,
    signature: &str,
    config: &TransactionFetchConfig,
    attempts: u32,
    min_backoff: Duration,
) -> Result<Option<TransactionRecord>, ConnectionError> {
    let attempts = attempts.max(1);
    let mut backoff = min_backoff;
    for attempt in 1..=attempts {
        if let Some(record) = connection.get_transaction(signature, config).await? {
            return Ok(Some(record));
        }
        tracing::debug!(attempt, "transaction record not yet available");
        if attempt < attempts {
            tokio::time::sleep(backoff).await;
            backoff = backoff.saturating_mul(2);
        }
    }
    Ok(None)
}
