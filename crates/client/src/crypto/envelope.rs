//! Chunked RSA-OAEP encryption of secret payloads.
//!
//! RSA-OAEP can only seal a short message per operation, so plaintext is cut
//! into [`PLAINTEXT_CHUNK`]-byte pieces and each piece is encrypted on its own
//! against the public half of the user's key. Every ciphertext chunk is
//! exactly the key's modulus size (512 bytes for a 4096-bit key), which is
//! how [`EnvelopeKey::decrypt`] finds the chunk boundaries again.
//!
//! Only the private key is ever stored; the public key is derived from it.

use std::fmt;

use rand::rngs::OsRng;
use rsa::{
    pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey, LineEnding},
    traits::PublicKeyParts,
    Oaep, RsaPrivateKey, RsaPublicKey,
};
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroizing;

/// Modulus size of generated keys, in bits.
pub const KEY_BITS: usize = 4096;

/// Plaintext bytes sealed by one RSA-OAEP operation.
pub const PLAINTEXT_CHUNK: usize = 128;

/// OAEP label bound into every chunk. Changing it makes existing blobs
/// undecryptable.
const OAEP_LABEL: &str = "yandex";

/// PKCS#1 PEM (`RSA PRIVATE KEY`), wiped from memory on drop.
pub type PrivateKeyPem = Zeroizing<String>;

/// Errors produced by the envelope layer.
///
/// Messages never include plaintext or key bytes.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Key generation or PEM encoding failed.
    #[error("failed to generate key: {0}")]
    KeyGeneration(String),

    /// The key could not be parsed or a chunk could not be encrypted.
    #[error("failed to encrypt data: {0}")]
    Encrypt(String),

    /// The key could not be parsed, the blob is malformed, or a chunk does
    /// not decrypt under this key.
    #[error("failed to decrypt data: {0}")]
    Decrypt(String),
}

/// A parsed private key ready for repeated encrypt and decrypt calls.
///
/// Key material is zeroized when the handle is dropped.
#[derive(Clone)]
pub struct EnvelopeKey {
    private: RsaPrivateKey,
    public: RsaPublicKey,
}

impl EnvelopeKey {
    /// Generate a fresh [`KEY_BITS`]-bit key.
    ///
    /// CPU-bound for several hundred milliseconds; call from a blocking context.
    pub fn generate() -> Result<Self, EnvelopeError> {
        let private = RsaPrivateKey::new(&mut OsRng, KEY_BITS)
            .map_err(|e| EnvelopeError::KeyGeneration(e.to_string()))?;
        Ok(Self::from_private(private))
    }

    /// Parse a PKCS#1 PEM private key.
    ///
    /// A parse failure surfaces as [`EnvelopeError::Decrypt`] because the key
    /// is only ever loaded to read or write secrets.
    pub fn from_pem(pem: &str) -> Result<Self, EnvelopeError> {
        let private = RsaPrivateKey::from_pkcs1_pem(pem)
            .map_err(|e| EnvelopeError::Decrypt(format!("malformed private key: {e}")))?;
        Ok(Self::from_private(private))
    }

    fn from_private(private: RsaPrivateKey) -> Self {
        let public = private.to_public_key();
        Self { private, public }
    }

    /// Encode the private key as PKCS#1 PEM.
    pub fn to_pem(&self) -> Result<PrivateKeyPem, EnvelopeError> {
        self.private
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| EnvelopeError::KeyGeneration(format!("PEM encoding failed: {e}")))
    }

    /// Size of one ciphertext chunk, in bytes.
    pub fn modulus_size(&self) -> usize {
        self.public.size()
    }

    /// Encrypt `plaintext` chunk by chunk. Empty input yields an empty blob.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
        let chunks = plaintext.len().div_ceil(PLAINTEXT_CHUNK);
        let mut blob = Vec::with_capacity(chunks * self.modulus_size());
        let mut rng = OsRng;

        for (index, chunk) in plaintext.chunks(PLAINTEXT_CHUNK).enumerate() {
            let sealed = self
                .public
                .encrypt(&mut rng, padding(), chunk)
                .map_err(|e| EnvelopeError::Encrypt(format!("chunk {index}: {e}")))?;
            blob.extend_from_slice(&sealed);
        }
        Ok(blob)
    }

    /// Decrypt a blob produced by [`EnvelopeKey::encrypt`] under the same key.
    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
        let size = self.modulus_size();
        if blob.len() % size != 0 {
            return Err(EnvelopeError::Decrypt(format!(
                "blob length {} is not a multiple of the {size}-byte chunk size",
                blob.len()
            )));
        }

        let mut plaintext = Vec::with_capacity(blob.len() / size * PLAINTEXT_CHUNK);
        for (index, chunk) in blob.chunks(size).enumerate() {
            let opened = Zeroizing::new(
                self.private
                    .decrypt(padding(), chunk)
                    .map_err(|e| EnvelopeError::Decrypt(format!("chunk {index}: {e}")))?,
            );
            plaintext.extend_from_slice(&opened);
        }
        Ok(plaintext)
    }
}

impl fmt::Debug for EnvelopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvelopeKey")
            .field("bits", &(self.modulus_size() * 8))
            .field("private", &"<redacted>")
            .finish()
    }
}

fn padding() -> Oaep {
    Oaep::new_with_label::<Sha256, _>(OAEP_LABEL)
}

/// Generate a new key pair and return its private half as PKCS#1 PEM.
pub fn generate_key_pair() -> Result<PrivateKeyPem, EnvelopeError> {
    EnvelopeKey::generate()?.to_pem()
}

/// Encrypt `plaintext` under the public half of `pem`.
pub fn encrypt(pem: &str, plaintext: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    let key = RsaPrivateKey::from_pkcs1_pem(pem)
        .map_err(|e| EnvelopeError::Encrypt(format!("malformed private key: {e}")))?;
    EnvelopeKey::from_private(key).encrypt(plaintext)
}

/// Decrypt `blob` with the private key in `pem`.
pub fn decrypt(pem: &str, blob: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    EnvelopeKey::from_pem(pem)?.decrypt(blob)
}
