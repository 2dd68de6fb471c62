//! SHA-256 digests of transaction bodies.

use crate::error::{Result, SignetError};
use sha2::{Digest as _, Sha256};

/// The size of a SHA-256 digest in bytes.
pub const DIGEST_SIZE: usize = 32;

/// A SHA-256 digest of signed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_SIZE]);

impl Digest {
    /// Create a digest from a slice, which must be exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; DIGEST_SIZE] = bytes.try_into().map_err(|_| {
            SignetError::Verify(format!(
                "Invalid digest length: expected {}, got {}",
                DIGEST_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Get the raw bytes of the digest.
    pub fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
        &self.0
    }

    /// Encode the digest as a hexadecimal string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// Compute the SHA-256 digest of a byte slice.
pub fn digest_bytes(data: &[u8]) -> Digest {
    Digest(Sha256::digest(data).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_bytes() {
        let digest = digest_bytes(b"Hello, World!");
        assert_eq!(digest, digest_bytes(b"Hello, World!"));
        assert_ne!(digest, digest_bytes(b"Different data"));
    }

    #[test]
    fn test_known_vector() {
        assert_eq!(
            digest_bytes(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_from_slice_rejects_wrong_length() {
        assert!(Digest::from_slice(&[0u8; 31]).is_err());
        assert!(Digest::from_slice(&[0u8; 33]).is_err());

        let digest = digest_bytes(b"Test");
        assert_eq!(Digest::from_slice(digest.as_bytes()).unwrap(), digest);
    }
}
