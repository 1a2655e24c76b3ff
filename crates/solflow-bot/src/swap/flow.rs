use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use solana_keypair::Keypair;
use solana_signer::Signer;
use solana_transaction::versioned::VersionedTransaction;
use solflow_tx::{
    BlockhashExpiry, ConnectionError, RpcConnection, SignedTx, SigningError,
    SimulateTransactionConfig, SubmitError, TransactionRecord, TxConfirmClient,
    extract_transaction_signature, sign_transaction,
};
use thiserror::Error;

use crate::aggregator::{AggregatorClient, AggregatorError, QuoteParams, SwapResponse};

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("failed to fetch swap quote: {source}")]
    Quote { source: AggregatorError },
    #[error("failed to build swap transaction: {source}")]
    Swap { source: AggregatorError },
    #[error("failed to decode aggregator transaction payload: {source}")]
    DecodeTransaction { source: base64::DecodeError },
    #[error("failed to deserialize aggregator transaction: {source}")]
    DeserializeTransaction { source: Box<bincode::ErrorKind> },
    #[error("failed to sign swap transaction: {source}")]
    Sign { source: SigningError },
    #[error("failed to package signed transaction: {source}")]
    Package { source: SubmitError },
    #[error("failed to simulate swap transaction: {source}")]
    Simulate { source: ConnectionError },
    #[error("simulation rejected the swap transaction: {err}")]
    SimulationFailed {
        err: serde_json::Value,
        logs: Vec<String>,
    },
    #[error("failed to submit swap transaction: {source}")]
    Submit { source: SubmitError },
}

/// One webhook-triggered swap from quote to settled record.
pub struct SwapFlow {
    aggregator: AggregatorClient,
    connection: Arc<dyn RpcConnection>,
    confirm_client: TxConfirmClient,
    keypair: Keypair,
    quote_params: QuoteParams,
    priority_fee_lamports: u64,
}

impl SwapFlow {
    #[must_use]
    pub fn new(
        aggregator: AggregatorClient,
        connection: Arc<dyn RpcConnection>,
        confirm_client: TxConfirmClient,
        keypair: Keypair,
        quote_params: QuoteParams,
        priority_fee_lamports: u64,
    ) -> Self {
        Self {
            aggregator,
            connection,
            confirm_client,
            keypair,
            quote_params,
            priority_fee_lamports,
        }
    }

    /// Runs one swap end to end: quote, build, sign, simulate, submit, and
    /// wait for the settled record.
    ///
    /// `Ok(None)` means the transaction never became visible before its
    /// blockhash expired; retrying is the caller's call.
    ///
    /// # Errors
    ///
    /// Returns a [`FlowError`] naming the step that failed. A simulation
    /// rejection aborts the flow before anything reaches the network.
    pub async fn run(&self) -> Result<Option<TransactionRecord>, FlowError> {
        let quote = self
            .aggregator
            .quote(&self.quote_params)
            .await
            .map_err(|source| FlowError::Quote { source })?;
        if let Some(out_amount) = quote.out_amount() {
            tracing::info!(out_amount, "swap quote received");
        } else {
            tracing::info!("swap quote received");
        }

        let swap = self
            .aggregator
            .swap(&quote, &self.keypair.pubkey(), self.priority_fee_lamports)
            .await
            .map_err(|source| FlowError::Swap { source })?;
        tracing::debug!(
            last_valid_block_height = swap.last_valid_block_height,
            "swap transaction received"
        );

        let (signed_tx, expiry) = prepare_transaction(&self.keypair, &swap)?;

        let simulation = self
            .connection
            .simulate_transaction(signed_tx.bytes(), &SimulateTransactionConfig::default())
            .await
            .map_err(|source| FlowError::Simulate { source })?;
        if let Some(err) = simulation.err {
            let logs = simulation.logs.unwrap_or_default();
            tracing::error!(
                error = %err,
                simulation_logs = ?logs,
                "simulation rejected the swap transaction"
            );
            return Err(FlowError::SimulationFailed { err, logs });
        }

        let record = self
            .confirm_client
            .send_and_confirm(&signed_tx, &expiry)
            .await
            .map_err(|source| FlowError::Submit { source })?;

        match &record {
            Some(record) => {
                if let Ok(signature) = extract_transaction_signature(signed_tx.transaction()) {
                    let explorer_url = format!("https://solscan.io/tx/{signature}");
                    tracing::info!(%explorer_url, slot = record.slot, "swap landed");
                }
                if let Some(meta) = &record.meta
                    && let Some(err) = &meta.err
                {
                    tracing::error!(error = %err, "swap transaction failed on chain");
                }
            }
            None => {
                tracing::warn!("swap not confirmed within the validity window");
            }
        }

        Ok(record)
    }
}

/// Decodes the aggregator payload, re-signs its message, and packages the
/// result with the blockhash validity window the aggregator reported.
fn prepare_transaction(
    keypair: &Keypair,
    swap: &SwapResponse,
) -> Result<(SignedTx, BlockhashExpiry), FlowError> {
    let tx_bytes = BASE64_STANDARD
        .decode(&swap.swap_transaction)
        .map_err(|source| FlowError::DecodeTransaction { source })?;
    let unsigned: VersionedTransaction = bincode::deserialize(&tx_bytes)
        .map_err(|source| FlowError::DeserializeTransaction { source })?;
    // The aggregator leaves a placeholder in the signature slot; only the
    // message survives into the broadcast transaction.
    let blockhash = *unsigned.message.recent_blockhash();
    let signed = sign_transaction(unsigned.message, &[keypair])
        .map_err(|source| FlowError::Sign { source })?;
    let expiry = BlockhashExpiry {
        blockhash,
        last_valid_block_height: swap.last_valid_block_height,
    };
    let signed_tx = SignedTx::new(signed).map_err(|source| FlowError::Package { source })?;
    Ok((signed_tx, expiry))
}

#[cfg(test)]
mod tests {
    use solana_hash::Hash;
    use solana_message::{Message, VersionedMessage};
    use solana_signature::Signature;

    use super::*;

    fn aggregator_payload(keypair: &Keypair, last_valid_block_height: u64) -> SwapResponse {
        let recipient = Keypair::new();
        let instruction = solana_system_interface::instruction::transfer(
            &keypair.pubkey(),
            &recipient.pubkey(),
            1,
        );
        let blockhash = Hash::new_from_array([9_u8; 32]);
        let message =
            Message::new_with_blockhash(&[instruction], Some(&keypair.pubkey()), &blockhash);
        let unsigned = VersionedTransaction {
            signatures: vec![Signature::default()],
            message: VersionedMessage::Legacy(message),
        };
        let bytes = bincode::serialize(&unsigned).unwrap_or_default();
        SwapResponse {
            swap_transaction: BASE64_STANDARD.encode(bytes),
            last_valid_block_height,
        }
    }

    #[test]
    fn prepare_transaction_signs_the_aggregator_payload() {
        let keypair = Keypair::new();
        let swap = aggregator_payload(&keypair, 1_234);

        let prepared = prepare_transaction(&keypair, &swap);
        assert!(prepared.is_ok());
        if let Ok((signed_tx, expiry)) = prepared {
            assert_eq!(expiry.last_valid_block_height, 1_234);
            assert_eq!(expiry.blockhash, Hash::new_from_array([9_u8; 32]));
            let first_signature = signed_tx.transaction().signatures.first().copied();
            assert_ne!(first_signature, None);
            assert_ne!(first_signature, Some(Signature::default()));
            assert!(!signed_tx.bytes().is_empty());
        }
    }

    #[test]
    fn prepare_transaction_rejects_bad_base64() {
        let keypair = Keypair::new();
        let swap = SwapResponse {
            swap_transaction: "not-base64!!!".to_string(),
            last_valid_block_height: 1,
        };

        let prepared = prepare_transaction(&keypair, &swap);
        assert!(matches!(
            prepared,
            Err(FlowError::DecodeTransaction { .. })
        ));
    }

    #[test]
    fn prepare_transaction_rejects_garbage_bytes() {
        let keypair = Keypair::new();
        let swap = SwapResponse {
            swap_transaction: BASE64_STANDARD.encode([0xFF_u8; 8]),
            last_valid_block_height: 1,
        };

        let prepared = prepare_transaction(&keypair, &swap);
        assert!(matches!(
            prepared,
            Err(FlowError::DeserializeTransaction { .. })
        ));
    }
}
