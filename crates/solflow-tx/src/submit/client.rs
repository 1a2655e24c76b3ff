//! Submission client orchestrating send, confirm, and fetch.

use std::{sync::Arc, time::Duration};

use super::{
    BlockhashExpiry, CancelFlag, ConfirmationOutcome, DEFAULT_BLOCK_HEIGHT_SAFETY_MARGIN,
    DEFAULT_RECORD_FETCH_ATTEMPTS, DEFAULT_RECORD_FETCH_BACKOFF, DEFAULT_RESEND_INTERVAL,
    DEFAULT_STATUS_POLL_INTERVAL, RpcConnection, SendTransactionConfig, SignedTx, SubmitError,
    TransactionFetchConfig, TransactionRecord, confirm::race_confirmation,
    fetch::fetch_transaction_record, resend::spawn_rebroadcaster,
};
use crate::signature::extract_transaction_signature;

/// Transaction submission client that sends, rebroadcasts, confirms, and
/// fetches the settled record in one call.
pub struct TxConfirmClient {
    /// RPC connection shared with the rebroadcast task.
    connection: Arc<dyn RpcConnection>,
    /// Send tuning used for the initial broadcast and rebroadcasts.
    send_config: SendTransactionConfig,
    /// Record fetch tuning.
    fetch_config: TransactionFetchConfig,
    /// Interval between rebroadcasts.
    resend_interval: Duration,
    /// Interval between direct status polls.
    status_poll_interval: Duration,
    /// Blocks shaved off the blockhash validity window.
    safety_margin: u64,
    /// Record fetch attempt budget.
    record_fetch_attempts: u32,
    /// Initial backoff between record fetch attempts.
    record_fetch_backoff: Duration,
}

impl TxConfirmClient {
    /// Creates a client with default tuning.
    #[must_use]
    pub fn new(connection: Arc<dyn RpcConnection>) -> Self {
        Self {
            connection,
            send_config: SendTransactionConfig::default(),
            fetch_config: TransactionFetchConfig::default(),
            resend_interval: DEFAULT_RESEND_INTERVAL,
            status_poll_interval: DEFAULT_STATUS_POLL_INTERVAL,
            safety_margin: DEFAULT_BLOCK_HEIGHT_SAFETY_MARGIN,
            record_fetch_attempts: DEFAULT_RECORD_FETCH_ATTEMPTS,
            record_fetch_backoff: DEFAULT_RECORD_FETCH_BACKOFF,
        }
    }

    /// Sets send tuning.
    #[must_use]
    pub const fn with_send_config(mut self, config: SendTransactionConfig) -> Self {
        self.send_config = config;
        self
    }

    /// Sets record fetch tuning.
    #[must_use]
    pub const fn with_fetch_config(mut self, config: TransactionFetchConfig) -> Self {
        self.fetch_config = config;
        self
    }

    /// Sets the rebroadcast interval.
    #[must_use]
    pub const fn with_resend_interval(mut self, interval: Duration) -> Self {
        self.resend_interval = interval;
        self
    }

    /// Sets the status poll interval.
    #[must_use]
    pub const fn with_status_poll_interval(mut self, interval: Duration) -> Self {
        self.status_poll_interval = interval;
        self
    }

    /// Sets the block height safety margin.
    #[must_use]
    pub const fn with_safety_margin(mut self, margin: u64) -> Self {
        self.safety_margin = margin;
        self
    }

    /// Sets the record fetch attempt budget.
    #[must_use]
    pub const fn with_record_fetch_attempts(mut self, attempts: u32) -> Self {
        self.record_fetch_attempts = attempts;
        self
    }

    /// Sets the initial backoff between record fetch attempts.
    #[must_use]
    pub const fn with_record_fetch_backoff(mut self, backoff: Duration) -> Self {
        self.record_fetch_backoff = backoff;
        self
    }

    /// Sends a signed transaction and drives it through confirmation to the
    /// settled transaction record.
    ///
    /// The transaction is broadcast once, then rebroadcast on a fixed interval
    /// while a blockhash-scoped confirmation wait races direct status polling.
    /// Whichever branch settles first cancels the shared flag, which stops the
    /// rebroadcast task on its next pass. Expiry of the shortened window is
    /// not an error; the record fetch still runs, and `Ok(None)` reports a
    /// transaction that never became visible.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError`] when the transaction carries no signature, the
    /// initial broadcast fails, or the confirmation wait or record fetch hit a
    /// connection error.
    pub async fn send_and_confirm(
        &self,
        signed_tx: &SignedTx,
        expiry: &BlockhashExpiry,
    ) -> Result<Option<TransactionRecord>, SubmitError> {
        let signature = extract_transaction_signature(signed_tx.transaction())
            .map_err(|source| SubmitError::Signature { source })?
            .to_string();

        self.connection
            .send_transaction(signed_tx.bytes(), &self.send_config)
            .await
            .map_err(|source| SubmitError::Send { source })?;
        tracing::info!(%signature, "transaction sent");

        let cancel = CancelFlag::new();
        let _resend_task = spawn_rebroadcaster(
            Arc::clone(&self.connection),
            signed_tx.bytes().to_vec(),
            self.send_config,
            self.resend_interval,
            cancel.clone(),
        );

        let adjusted_expiry = expiry.with_safety_margin(self.safety_margin);
        let outcome = race_confirmation(
            self.connection.as_ref(),
            &signature,
            &adjusted_expiry,
            self.status_poll_interval,
            &cancel,
        )
        .await;
        // The rebroadcast task stops on the next pass whichever way the race
        // ended. Cancelling twice is harmless.
        cancel.cancel();
        let outcome = outcome.map_err(|source| SubmitError::Confirm { source })?;

        match &outcome {
            ConfirmationOutcome::Confirmed(status) => {
                tracing::info!(%signature, slot = status.slot, "transaction confirmed");
            }
            ConfirmationOutcome::ExpiredWithoutConfirmation => {
                tracing::warn!(
                    %signature,
                    last_valid_block_height = adjusted_expiry.last_valid_block_height,
                    "confirmation window closed without a confirmation"
                );
            }
        }

        let record = fetch_transaction_record(
            self.connection.as_ref(),
            &signature,
            &self.fetch_config,
            self.record_fetch_attempts,
            self.record_fetch_backoff,
        )
        .await
        .map_err(|source| SubmitError::FetchRecord { source })?;
        if record.is_none() {
            tracing::warn!(%signature, "transaction record not found after fetch attempts");
        }
        Ok(record)
    }
}
