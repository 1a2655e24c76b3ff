//! Canonical transaction identifier extraction.

use solana_signature::Signature;
use solana_transaction::versioned::VersionedTransaction;
use thiserror::Error;

/// Signature extraction errors.
#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
pub enum SignatureError {
    /// Transaction carries no usable signature.
    #[error("missing transaction signature; the transaction was not signed by the fee payer")]
    MissingSignature,
}

/// Returns the canonical identifier of a signed transaction: its first signature.
///
/// The base-58 rendering of the returned [`Signature`] is the identifier the
/// network answers status and record lookups under.
///
/// # Errors
///
/// Returns [`SignatureError::MissingSignature`] when the transaction holds no
/// signature slots or only the all-zero placeholder left by an unsigned
/// message. That is a caller contract violation, not a runtime condition.
pub fn extract_transaction_signature(
    tx: &VersionedTransaction,
) -> Result<Signature, SignatureError> {
    tx.signatures
        .first()
        .copied()
        .filter(|signature| *signature != Signature::default())
        .ok_or(SignatureError::MissingSignature)
}

#[cfg(test)]
mod tests {
    use solana_hash::Hash;
    use solana_keypair::Keypair;
    use solana_message::{Message, VersionedMessage};
    use solana_signer::Signer;
    use solana_transaction::versioned::VersionedTransaction;

    use super::*;

    #[test]
    fn signed_transaction_yields_base58_identifier() {
        let payer = Keypair::new();
        let recipient = Keypair::new();
        let instruction = solana_system_interface::instruction::transfer(
            &payer.pubkey(),
            &recipient.pubkey(),
            1,
        );
        let blockhash = Hash::new_from_array([5_u8; 32]);
        let message =
            Message::new_with_blockhash(&[instruction], Some(&payer.pubkey()), &blockhash);
        let tx_result = VersionedTransaction::try_new(VersionedMessage::Legacy(message), &[&payer]);

        assert!(tx_result.is_ok());
        if let Ok(tx) = tx_result {
            let extracted = extract_transaction_signature(&tx);
            assert!(extracted.is_ok());
            if let Ok(signature) = extracted {
                assert_ne!(signature, Signature::default());
                assert!(!signature.to_string().is_empty());
            }
        }
    }

    #[test]
    fn transaction_without_signature_slots_is_rejected() {
        let tx = VersionedTransaction::default();
        assert!(tx.signatures.is_empty());
        assert_eq!(
            extract_transaction_signature(&tx),
            Err(SignatureError::MissingSignature)
        );
    }

    #[test]
    fn placeholder_signature_is_rejected() {
        let tx = VersionedTransaction {
            signatures: vec![Signature::default()],
            ..VersionedTransaction::default()
        };
        assert_eq!(
            extract_transaction_signature(&tx),
            Err(SignatureError::MissingSignature)
        );
    }
}
