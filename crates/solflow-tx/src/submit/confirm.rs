//! Confirmation race between the scoped wait and direct status polling.

use std::time::Duration;

use solana_commitment_config::CommitmentLevel;

use super::{
    BlockhashExpiry, CancelFlag, ConfirmationOutcome, ConnectionError, RpcConnection,
    SignatureStatus, SignatureStatusConfig,
};

/// Races the connection's scoped confirmation wait against direct status
/// polling; the first branch to settle decides the outcome and the other is
/// dropped.
///
/// Expiry of the scoped wait and an exhausted poll both map to
/// [`ConfirmationOutcome::ExpiredWithoutConfirmation`]. Any other connection
/// error aborts the race.
pub(super) async fn race_confirmation(
    connection: &dyn RpcConnection,
    signature: &str,
    expiry: &BlockhashExpiry,
    poll_interval: Duration,
    cancel: &CancelFlag,
) -> Result<ConfirmationOutcome, ConnectionError> {
    tokio::select! {
        confirmed = connection.confirm_transaction(signature, expiry) => match confirmed {
            Ok(status) => Ok(ConfirmationOutcome::Confirmed(status)),
            Err(ConnectionError::BlockhashExpired { .. }) => {
                Ok(ConfirmationOutcome::ExpiredWithoutConfirmation)
            }
            Err(error) => Err(error),
        },
        polled = poll_signature_status(connection, signature, poll_interval, cancel) => {
            match polled {
                Ok(Some(status)) => Ok(ConfirmationOutcome::Confirmed(status)),
                Ok(None) => Ok(ConfirmationOutcome::ExpiredWithoutConfirmation),
                Err(error) => Err(error),
            }
        }
    }
}

/// Polls the recent status cache every `poll_interval` until the signature
/// reaches confirmed commitment or `cancel` is set.
///
/// The cancel check runs before each wait, so a flag set ahead of the call
/// returns without issuing a single query. Queries never search the ledger
/// history; a status the cache has already evicted stays invisible here.
pub(super) async fn poll_signature_status(
    connection: &dyn RpcConnection,
    signature: &str,
    poll_interval: Duration,
    cancel: &CancelFlag,
) -> Result<Option<SignatureStatus>, ConnectionError> {
    while !cancel.is_cancelled() {
        tokio::time::sleep(poll_interval).await;
        if let Some(status) = connection
            .get_signature_status(signature, &SignatureStatusConfig::default())
            .await?
            && status.meets_commitment(CommitmentLevel::Confirmed)
        {
            return Ok(Some(status));
        }
    }
    Ok(None)
}
