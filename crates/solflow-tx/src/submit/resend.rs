//! Periodic rebroadcast of a pending transaction.

use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;

use super::{CancelFlag, RpcConnection, SendTransactionConfig};

/// Spawns a task that rebroadcasts `tx_bytes` every `resend_interval` until
/// `cancel` is set.
///
/// Each pass waits first and checks the flag afterwards, so a confirmation
/// landing inside the interval stops the task before another send goes out.
/// Send failures are logged and do not stop the loop; the next pass tries
/// again.
#[must_use]
pub(super) fn spawn_rebroadcaster(
    connection: Arc<dyn RpcConnection>,
    tx_bytes: Vec<u8>,
    send_config: SendTransactionConfig,
    resend_interval: Duration,
    cancel: CancelFlag,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut resends: u64 = 0;
        loop {
            tokio::time::sleep(resend_interval).await;
            if cancel.is_cancelled() {
                tracing::debug!(resends, "rebroadcast loop stopped");
                return;
            }
            match connection.send_transaction(&tx_bytes, &send_config).await {
                Ok(_) => {
                    resends = resends.saturating_add(1);
                    tracing::debug!(resends, "rebroadcast pending transaction");
                }
                Err(error) => {
                    tracing::warn!(error = %error, "transaction rebroadcast failed");
                }
            }
        }
    })
}
