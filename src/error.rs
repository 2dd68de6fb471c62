//! Error types for the signet library.

use thiserror::Error;

/// The main error type for signet operations.
#[derive(Error, Debug)]
pub enum SignetError {
    /// The randomness source failed while generating a key.
    #[error("Key generation failed: {0}")]
    KeyGen(String),

    /// The key file could not be read.
    #[error("Failed to read key file: {0}")]
    KeyRead(#[source] std::io::Error),

    /// No PEM envelope was found, or it carried an unexpected label.
    #[error("Invalid key envelope: {0}")]
    KeyDecode(String),

    /// The envelope payload is not a valid PKCS#1 RSA private key.
    #[error("Malformed key material: {0}")]
    KeyParse(String),

    /// The key file could not be written.
    #[error("Failed to write key file: {0}")]
    KeyWrite(#[source] std::io::Error),

    /// The transaction is not valid JSON.
    #[error("Malformed transaction JSON: {0}")]
    TxParse(#[source] serde_json::Error),

    /// The transaction JSON does not match the expected document shape.
    #[error("Invalid transaction: {0}")]
    TxSchema(String),

    /// Signing failed, including a signature that does not verify under its own key.
    #[error("Signing failed: {0}")]
    Sign(String),

    /// Signature verification failed.
    #[error("Verification failed: {0}")]
    Verify(String),

    /// No transaction has been set on the signer.
    #[error("No transaction loaded")]
    NoTransaction,

    /// A document could not be serialized to JSON.
    #[error("JSON serialization error: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Other I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SignetError {
    /// Sort a transaction decoding error into a syntax or a schema failure.
    pub(crate) fn from_tx_json(err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        match err.classify() {
            Category::Data => SignetError::TxSchema(err.to_string()),
            Category::Syntax | Category::Eof | Category::Io => SignetError::TxParse(err),
        }
    }
}

/// Result type alias for signet operations.
pub type Result<T> = std::result::Result<T, SignetError>;
