//! Signing boundary for externally built transaction messages.

use solana_message::VersionedMessage;
use solana_signer::{SignerError, signers::Signers};
use solana_transaction::versioned::VersionedTransaction;
use thiserror::Error;

/// Signing-layer errors.
#[derive(Debug, Error)]
pub enum SigningError {
    /// Signing failed with signer-level error.
    #[error("failed to sign transaction message: {source}")]
    SignTransaction {
        /// Underlying signer error.
        source: SignerError,
    },
}

/// Signs a prebuilt versioned message with the provided signers.
///
/// Aggregator APIs return serialized transactions whose signature slots hold
/// placeholders; re-signing the embedded message produces the broadcastable
/// transaction.
///
/// # Errors
///
/// Returns [`SigningError::SignTransaction`] when signer validation or signing
/// fails.
pub fn sign_transaction<T>(
    message: VersionedMessage,
    signers: &T,
) -> Result<VersionedTransaction, SigningError>
where
    T: Signers + ?Sized,
{
    VersionedTransaction::try_new(message, signers)
        .map_err(|source| SigningError::SignTransaction { source })
}

#[cfg(test)]
mod tests {
    use solana_hash::Hash;
    use solana_keypair::Keypair;
    use solana_message::{Message, VersionedMessage};
    use solana_signature::Signature;
    use solana_signer::Signer;

    use super::*;

    #[test]
    fn signing_fills_the_signature_slot() {
        let payer = Keypair::new();
        let recipient = Keypair::new();
        let instruction = solana_system_interface::instruction::transfer(
            &payer.pubkey(),
            &recipient.pubkey(),
            1,
        );
        let blockhash = Hash::new_from_array([6_u8; 32]);
        let message =
            Message::new_with_blockhash(&[instruction], Some(&payer.pubkey()), &blockhash);

        let tx_result = sign_transaction(VersionedMessage::Legacy(message), &[&payer]);
        assert!(tx_result.is_ok());
        if let Ok(tx) = tx_result {
            assert_eq!(tx.signatures.len(), 1);
            assert_ne!(tx.signatures.first().copied(), Some(Signature::default()));
        }
    }

    #[test]
    fn signing_with_the_wrong_keypair_fails() {
        let payer = Keypair::new();
        let stranger = Keypair::new();
        let recipient = Keypair::new();
        let instruction = solana_system_interface::instruction::transfer(
            &payer.pubkey(),
            &recipient.pubkey(),
            1,
        );
        let blockhash = Hash::new_from_array([7_u8; 32]);
        let message =
            Message::new_with_blockhash(&[instruction], Some(&payer.pubkey()), &blockhash);

        let tx_result = sign_transaction(VersionedMessage::Legacy(message), &[&stranger]);
        assert!(matches!(
            tx_result,
            Err(SigningError::SignTransaction { .. })
        ));
    }
}
