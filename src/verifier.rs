//! Signature verification for signed transactions.

use crate::error::{Result, SignetError};
use crate::hash::{digest_bytes, Digest};
use crate::keys::KeyHandler;
use crate::transaction::Transaction;

/// Result of verifying the signature stored under one stream ID.
#[derive(Debug, Clone)]
pub struct StreamResult {
    /// The stream ID the signature is stored under.
    pub stream_id: String,

    /// Whether the signature is valid.
    pub valid: bool,

    /// Error message if verification failed.
    pub error: Option<String>,
}

/// Result of verifying all signatures of a transaction.
#[derive(Debug)]
pub struct VerificationResult {
    /// Whether all signatures are valid.
    pub all_valid: bool,

    /// Digest of the transaction body the signatures were checked against.
    pub digest: Digest,

    /// Results for each signature, in stream ID order.
    pub streams: Vec<StreamResult>,
}

impl VerificationResult {
    /// Get the number of valid signatures.
    pub fn valid_count(&self) -> usize {
        self.streams.iter().filter(|s| s.valid).count()
    }

    /// Get the number of invalid signatures.
    pub fn invalid_count(&self) -> usize {
        self.streams.iter().filter(|s| !s.valid).count()
    }

    /// Stream IDs whose signature verified.
    pub fn valid_streams(&self) -> Vec<&str> {
        self.streams
            .iter()
            .filter(|s| s.valid)
            .map(|s| s.stream_id.as_str())
            .collect()
    }

    /// Stream IDs whose signature did not verify.
    pub fn invalid_streams(&self) -> Vec<&str> {
        self.streams
            .iter()
            .filter(|s| !s.valid)
            .map(|s| s.stream_id.as_str())
            .collect()
    }
}

/// Verifier for transaction signatures.
pub struct Verifier;

impl Verifier {
    /// Check every entry of `$sigs` against the digest of the transaction body.
    pub fn verify_transaction(key: &dyn KeyHandler, tx: &Transaction) -> Result<VerificationResult> {
        if tx.signatures.is_empty() {
            return Err(SignetError::Verify(
                "No signatures found in transaction".to_string(),
            ));
        }

        let digest = digest_bytes(&tx.body_bytes()?);
        let mut all_valid = true;

        let streams = tx
            .signatures
            .iter()
            .map(|(stream_id, signature)| {
                let error = key
                    .verify(digest.as_bytes(), signature)
                    .err()
                    .map(|e| e.to_string());
                if error.is_some() {
                    all_valid = false;
                    tracing::debug!(stream_id = %stream_id, "signature rejected");
                }

                StreamResult {
                    stream_id: stream_id.clone(),
                    valid: error.is_none(),
                    error,
                }
            })
            .collect();

        Ok(VerificationResult {
            all_valid,
            digest,
            streams,
        })
    }

    /// Quick check if all signatures of a transaction are valid.
    pub fn is_valid(key: &dyn KeyHandler, tx: &Transaction) -> bool {
        Self::verify_transaction(key, tx)
            .map(|r| r.all_valid)
            .unwrap_or(false)
    }
}

/// Convenience function to verify a signed transaction.
pub fn verify_transaction(key: &dyn KeyHandler, tx: &Transaction) -> Result<VerificationResult> {
    Verifier::verify_transaction(key, tx)
}
