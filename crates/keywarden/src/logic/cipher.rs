//! AEAD key-wrapping primitive.
//!
//! All wrap/unwrap operations in the hierarchy go through [`KeyCipherLike`].
//! The default implementation is AES-256-GCM with a fresh random 96-bit
//! nonce per operation, prepended to the ciphertext and base64-encoded:
//!
//! ```text
//! base64( nonce (12 bytes) || ciphertext + GCM tag )
//! ```

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit, OsRng},
};
use base64::Engine;
use rand::RngCore;
use thiserror::Error;

/// Size of a wrapping key in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Size of the nonce in bytes (96 bits).
pub const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum CipherError {
    /// The payload cannot be unwrapped with the given key: authentication
    /// tag mismatch, tampered or truncated ciphertext, or invalid encoding.
    /// The caller receives no partial plaintext.
    #[error("ciphertext failed authentication")]
    Integrity,
    /// The operation itself could not run (bad key length, cipher failure).
    #[error("cipher operation failed: {0}")]
    Operation(String),
}

pub trait KeyCipherLike: Send + Sync {
    fn wrap(&self, key_bytes: &[u8], plaintext: &[u8]) -> Result<String, CipherError>;

    fn unwrap(&self, key_bytes: &[u8], wrapped: &str) -> Result<Vec<u8>, CipherError>;
}

pub struct Aes256GcmCipher;

impl KeyCipherLike for Aes256GcmCipher {
    fn wrap(&self, key_bytes: &[u8], plaintext: &[u8]) -> Result<String, CipherError> {
        if key_bytes.len() != KEY_LEN {
            return Err(CipherError::Operation(format!(
                "invalid key length: expected {KEY_LEN} bytes for AES-256, got {}",
                key_bytes.len()
            )));
        }

        let key = aes_gcm::Key::<Aes256Gcm>::from_slice(key_bytes);
        let cipher = Aes256Gcm::new(key);

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| CipherError::Operation(format!("encryption failed: {e}")))?;

        // Prepend the nonce to the ciphertext: [nonce (12 bytes) | ciphertext]
        let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);

        Ok(base64::engine::general_purpose::STANDARD.encode(&combined))
    }

    fn unwrap(&self, key_bytes: &[u8], wrapped: &str) -> Result<Vec<u8>, CipherError> {
        if key_bytes.len() != KEY_LEN {
            return Err(CipherError::Operation(format!(
                "invalid key length: expected {KEY_LEN} bytes for AES-256, got {}",
                key_bytes.len()
            )));
        }

        // Anything that is not a well-formed payload for this key is an
        // integrity failure from the caller's point of view.
        let encrypted = base64::engine::general_purpose::STANDARD
            .decode(wrapped)
            .map_err(|_| CipherError::Integrity)?;

        if encrypted.len() < NONCE_LEN {
            return Err(CipherError::Integrity);
        }

        let nonce = Nonce::from_slice(&encrypted[..NONCE_LEN]);
        let key = aes_gcm::Key::<Aes256Gcm>::from_slice(key_bytes);
        let cipher = Aes256Gcm::new(key);

        cipher
            .decrypt(nonce, &encrypted[NONCE_LEN..])
            .map_err(|_| CipherError::Integrity)
    }
}
