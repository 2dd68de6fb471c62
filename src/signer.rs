//! Transaction signing.

use crate::error::{Result, SignetError};
use crate::keys::KeyHandler;
use crate::transaction::Transaction;
use crate::verifier::Verifier;

/// Signs one transaction at a time with a bound key.
///
/// The signature over the compact JSON of `$tx` is stored in `$sigs` under
/// the lexicographically first input stream ID.
pub struct Signer<'a> {
    key: &'a dyn KeyHandler,
    tx: Option<Transaction>,
    input_streams: Vec<String>,
    output_streams: Vec<String>,
}

impl<'a> Signer<'a> {
    /// Create a new signer with the given key.
    pub fn new(key: &'a dyn KeyHandler) -> Self {
        Self {
            key,
            tx: None,
            input_streams: Vec::new(),
            output_streams: Vec::new(),
        }
    }

    /// Load a transaction, discarding any signatures it already carries.
    ///
    /// On failure the signer holds no transaction and [`Signer::sign`]
    /// returns [`SignetError::NoTransaction`].
    pub fn set_transaction(&mut self, json: &[u8]) -> Result<()> {
        self.tx = None;
        self.input_streams.clear();
        self.output_streams.clear();

        let mut tx = Transaction::parse(json)?;
        tx.signatures.clear();

        self.input_streams = tx.input_stream_ids();
        self.output_streams = tx.output_stream_ids();
        tracing::debug!(
            inputs = ?self.input_streams,
            outputs = ?self.output_streams,
            "transaction loaded"
        );

        self.tx = Some(tx);
        Ok(())
    }

    /// Load a transaction and return the signer for chaining.
    pub fn with_transaction(mut self, json: &[u8]) -> Result<Self> {
        self.set_transaction(json)?;
        Ok(self)
    }

    /// Sign the transaction body and store the signature under the first
    /// input stream ID, replacing any earlier signature there.
    pub fn sign(&mut self) -> Result<()> {
        let tx = self.tx.as_mut().ok_or(SignetError::NoTransaction)?;
        let stream_id = self
            .input_streams
            .first()
            .ok_or_else(|| SignetError::Sign("transaction has no input streams".to_string()))?;

        let body = tx.body_bytes()?;
        let signed = self.key.sign(&body)?;

        tracing::info!(
            stream_id = %stream_id,
            digest = %signed.digest.to_hex(),
            "transaction signed"
        );
        tx.signatures.insert(stream_id.clone(), signed.signature);
        Ok(())
    }

    /// Check every signature of `tx` against the bound key.
    pub fn verify(&self, tx: &Transaction) -> Result<()> {
        let result = Verifier::verify_transaction(self.key, tx)?;
        if result.all_valid {
            Ok(())
        } else {
            Err(SignetError::Verify(format!(
                "invalid signature for stream(s): {}",
                result.invalid_streams().join(", ")
            )))
        }
    }

    /// The current transaction, if one is loaded.
    pub fn transaction(&self) -> Option<&Transaction> {
        self.tx.as_ref()
    }

    /// Take the current transaction out of the signer.
    pub fn into_transaction(self) -> Option<Transaction> {
        self.tx
    }

    /// Input stream IDs of the current transaction, sorted.
    pub fn input_streams(&self) -> &[String] {
        &self.input_streams
    }

    /// Output stream IDs of the current transaction, sorted.
    pub fn output_streams(&self) -> &[String] {
        &self.output_streams
    }
}

/// Convenience function to sign transaction JSON in one call.
pub fn sign_transaction(key: &dyn KeyHandler, json: &[u8]) -> Result<Transaction> {
    let mut signer = Signer::new(key).with_transaction(json)?;
    signer.sign()?;
    signer.into_transaction().ok_or(SignetError::NoTransaction)
}
