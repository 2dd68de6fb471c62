//! Key generation and management for RSA transaction signing.

use crate::error::{Result, SignetError};
use crate::hash::{digest_bytes, Digest};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey, LineEnding};
use rsa::pkcs8::EncodePublicKey;
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use zeroize::Zeroizing;

/// Modulus size of generated keys.
pub const KEY_BITS: usize = 2048;

/// PEM label of the private key envelope (PKCS#1).
pub const PRIVATE_KEY_LABEL: &str = "RSA PRIVATE KEY";

/// PEM label of the public key envelope (SubjectPublicKeyInfo).
pub const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";

const PRIVATE_KEY_MODE: u32 = 0o600;
const PUBLIC_KEY_MODE: u32 = 0o644;

/// A signature together with the digest it was computed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signed {
    pub signature: Vec<u8>,
    pub digest: Digest,
}

/// The operations a signer needs from a key.
///
/// Implementors provide raw digest signing and verification; [`KeyHandler::sign`]
/// combines them so that every produced signature is checked against the
/// handler's own public key before it is handed out.
pub trait KeyHandler {
    /// Sign a SHA-256 digest.
    fn sign_digest(&self, digest: &Digest) -> Result<Vec<u8>>;

    /// Verify `signature` over a 32-byte SHA-256 `digest`.
    fn verify(&self, digest: &[u8], signature: &[u8]) -> Result<()>;

    /// Write the private key envelope to `path`.
    fn export(&self, path: &Path) -> Result<()>;

    /// The public key envelope matching the held private key.
    fn public_key_pem(&self) -> &str;

    /// Digest `data`, sign the digest and self-verify the result.
    fn sign(&self, data: &[u8]) -> Result<Signed> {
        let digest = digest_bytes(data);
        tracing::debug!(digest = %digest.to_hex(), len = data.len(), "signing payload");

        let signature = self.sign_digest(&digest)?;

        if let Err(e) = self.verify(digest.as_bytes(), &signature) {
            tracing::warn!(error = %e, "signature failed self-verification");
            return Err(SignetError::Sign(format!(
                "signature does not verify under its own key: {}",
                e
            )));
        }

        Ok(Signed { signature, digest })
    }
}

/// A 2048-bit RSA keypair signing with PKCS#1 v1.5 over SHA-256.
#[derive(Clone)]
pub struct RsaKeyHandler {
    private_key: RsaPrivateKey,
    private_pem: Zeroizing<String>,
    public_pem: String,
}

impl RsaKeyHandler {
    /// Generate a new random keypair from the operating system's CSPRNG.
    pub fn generate() -> Result<Self> {
        Self::generate_with(&mut OsRng)
    }

    /// Generate a new keypair from the given random source.
    ///
    /// A random source that reports failure yields [`SignetError::KeyGen`].
    pub fn generate_with<R: CryptoRng + RngCore>(rng: &mut R) -> Result<Self> {
        check_rng(rng).map_err(|e| SignetError::KeyGen(e.to_string()))?;
        let private_key =
            RsaPrivateKey::new(rng, KEY_BITS).map_err(|e| SignetError::KeyGen(e.to_string()))?;
        let handler = Self::from_private_key(private_key).map_err(|e| match e {
            SignetError::KeyParse(msg) => SignetError::KeyGen(msg),
            other => other,
        })?;

        tracing::info!(bits = KEY_BITS, "generated RSA keypair");
        Ok(handler)
    }

    /// Load a private key from a PEM file.
    pub fn import<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let pem = fs::read(path).map_err(SignetError::KeyRead)?;
        let handler = Self::from_pem(&pem)?;

        tracing::info!(path = %path.display(), "imported RSA private key");
        Ok(handler)
    }

    /// Parse a single `RSA PRIVATE KEY` envelope.
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        let trimmed = pem.trim_ascii();
        let (label, der) = rsa::pkcs1::der::pem::decode_vec(trimmed)
            .map_err(|e| SignetError::KeyDecode(e.to_string()))?;

        if label != PRIVATE_KEY_LABEL {
            return Err(SignetError::KeyDecode(format!(
                "expected \"{}\" envelope, found \"{}\"",
                PRIVATE_KEY_LABEL, label
            )));
        }

        let der = Zeroizing::new(der);
        let private_key =
            RsaPrivateKey::from_pkcs1_der(&der).map_err(|e| SignetError::KeyParse(e.to_string()))?;
        Self::from_private_key(private_key)
    }

    fn from_private_key(private_key: RsaPrivateKey) -> Result<Self> {
        let private_pem = private_key
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| SignetError::KeyParse(e.to_string()))?;
        let public_pem = private_key
            .to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| SignetError::KeyParse(e.to_string()))?;

        Ok(Self {
            private_key,
            private_pem,
            public_pem,
        })
    }

    /// The private key envelope.
    pub fn private_key_pem(&self) -> &str {
        &self.private_pem
    }

    /// The public half of the keypair.
    pub fn public_key(&self) -> RsaPublicKey {
        self.private_key.to_public_key()
    }

    /// Sign a digest, drawing blinding randomness from `rng`.
    ///
    /// A random source that reports failure yields [`SignetError::Sign`].
    pub fn sign_digest_with<R: CryptoRng + RngCore>(
        &self,
        rng: &mut R,
        digest: &Digest,
    ) -> Result<Vec<u8>> {
        check_rng(rng).map_err(|e| SignetError::Sign(e.to_string()))?;
        self.private_key
            .sign_with_rng(rng, Pkcs1v15Sign::new::<Sha256>(), digest.as_bytes())
            .map_err(|e| SignetError::Sign(e.to_string()))
    }

    /// Write the public key envelope to `path`.
    pub fn export_public_key<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        write_key_file(path, self.public_pem.as_bytes(), PUBLIC_KEY_MODE)
            .map_err(SignetError::KeyWrite)?;

        tracing::info!(path = %path.display(), "exported public key");
        Ok(())
    }
}

impl KeyHandler for RsaKeyHandler {
    fn sign_digest(&self, digest: &Digest) -> Result<Vec<u8>> {
        self.sign_digest_with(&mut OsRng, digest)
    }

    fn verify(&self, digest: &[u8], signature: &[u8]) -> Result<()> {
        let digest = Digest::from_slice(digest)?;

        let public_key = self.private_key.to_public_key();
        if signature.len() != public_key.size() {
            return Err(SignetError::Verify(format!(
                "Invalid signature length: expected {}, got {}",
                public_key.size(),
                signature.len()
            )));
        }

        public_key
            .verify(Pkcs1v15Sign::new::<Sha256>(), digest.as_bytes(), signature)
            .map_err(|e| SignetError::Verify(e.to_string()))
    }

    fn export(&self, path: &Path) -> Result<()> {
        write_key_file(path, self.private_pem.as_bytes(), PRIVATE_KEY_MODE)
            .map_err(SignetError::KeyWrite)?;

        tracing::info!(path = %path.display(), "exported private key");
        Ok(())
    }

    fn public_key_pem(&self) -> &str {
        &self.public_pem
    }
}

impl fmt::Debug for RsaKeyHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaKeyHandler")
            .field("public_pem", &self.public_pem)
            .finish_non_exhaustive()
    }
}

/// The `rsa` crate draws with the infallible `fill_bytes`, which panics on
/// failure, so a fallible draw up front turns that into an error.
fn check_rng<R: RngCore>(rng: &mut R) -> std::result::Result<(), rand::Error> {
    let mut sample = [0u8; 32];
    rng.try_fill_bytes(&mut sample)
}

fn write_key_file(path: &Path, contents: &[u8], mode: u32) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }

    let mut file = options.open(path)?;
    file.write_all(contents)?;

    // `mode` only applies to newly created files.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    Ok(())
}

/// A fixed keypair shared by the unit tests.
#[cfg(test)]
pub(crate) fn test_key() -> &'static RsaKeyHandler {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::OnceLock;

    static KEY: OnceLock<RsaKeyHandler> = OnceLock::new();
    KEY.get_or_init(|| {
        RsaKeyHandler::generate_with(&mut StdRng::seed_from_u64(0x5167_4e37)).unwrap()
    })
}
