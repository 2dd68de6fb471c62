//! # signet
//!
//! Signs ledger transaction documents with a 2048-bit RSA key.
//!
//! A transaction is a JSON document whose `$tx` body is digested with SHA-256
//! and signed with PKCS#1 v1.5. The signature is written back into the
//! document's `$sigs` map under the first input stream ID of the body.
//!
//! ## Features
//!
//! - **RSA keys** generated, imported and exported as PEM envelopes
//! - **Self-verification** of every signature before it is stored
//! - **Lossless documents**: unknown fields survive the signing round-trip
//! - **Deterministic** stream selection and signatures
//!
//! ## Quick Start
//!
//! ### Generate a Key
//!
//! ```rust
//! use signet::RsaKeyHandler;
//!
//! let key = RsaKeyHandler::generate().unwrap();
//! // Save to file (optional)
//! // key.export("signing_key.pem".as_ref()).unwrap();
//! ```
//!
//! ### Sign a Transaction
//!
//! ```rust
//! use signet::{RsaKeyHandler, Signer};
//!
//! let key = RsaKeyHandler::generate().unwrap();
//! let tx = br#"{"$tx":{"$namespace":"ns","$contract":"c","$i":{"stream_A":{"amount":10}}}}"#;
//!
//! let mut signer = Signer::new(&key).with_transaction(tx).unwrap();
//! signer.sign().unwrap();
//!
//! let signed = signer.transaction().unwrap();
//! assert!(signed.signatures.contains_key("stream_A"));
//! println!("{}", signed.to_indented().unwrap());
//! ```
//!
//! ### Verify a Signed Transaction
//!
//! ```rust
//! use signet::{sign_transaction, RsaKeyHandler, Verifier};
//!
//! let key = RsaKeyHandler::generate().unwrap();
//! let tx = br#"{"$tx":{"$namespace":"ns","$contract":"c","$i":{"stream_A":{}}}}"#;
//!
//! let signed = sign_transaction(&key, tx).unwrap();
//! let result = Verifier::verify_transaction(&key, &signed).unwrap();
//! assert!(result.all_valid);
//! ```

pub mod error;
pub mod hash;
pub mod keys;
pub mod signer;
pub mod transaction;
pub mod verifier;

// Re-export main types for convenience
pub use error::{Result, SignetError};
pub use hash::{digest_bytes, Digest};
pub use keys::{KeyHandler, RsaKeyHandler, Signed};
pub use signer::{sign_transaction, Signer};
pub use transaction::{SignatureMap, StreamMap, Transaction, TxBody};
pub use verifier::{verify_transaction, StreamResult, VerificationResult, Verifier};
