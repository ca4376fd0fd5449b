//! Key-material types for the three tiers of the hierarchy.
//!
//! Plaintext key material (`MasterKeyMaterial`, `PlainDataKey`) is held in
//! non-serializable newtypes that are zeroised on drop and redacted in debug
//! output. Wrapped forms are plain base64 strings and safe to persist or put
//! on the wire.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::logic::cipher::KEY_LEN;

/// Plaintext of a per-table master key. Generated once per table, persisted
/// only in wrapped form, and reconstructed in memory for the duration of a
/// single request.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterKeyMaterial(Vec<u8>);

impl MasterKeyMaterial {
    /// Mint a fresh random master key of the cipher's required length.
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub(crate) fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for MasterKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MasterKeyMaterial(************)")
    }
}

/// Caller-supplied plaintext data key. Exists only for the duration of one
/// request and is never persisted.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PlainDataKey(Vec<u8>);

impl PlainDataKey {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn expose(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for PlainDataKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PlainDataKey(************)")
    }
}

/// A data key wrapped under a master key (base64 nonce-prefixed ciphertext).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, ToSchema)]
#[serde(transparent)]
pub struct WrappedDataKey(pub String);

/// A master key wrapped under the root key (base64 nonce-prefixed
/// ciphertext). This is the only form in which master keys are stored.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(transparent)]
pub struct WrappedMasterKey(pub String);

/// Registry row binding one master key to exactly one table.
#[derive(Clone, Debug)]
pub struct MasterKeyRecord {
    pub master_key_id: String,
    pub table: String,
    pub wrapped_master_key: WrappedMasterKey,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod unit_test {
    use super::*;

    #[test]
    fn generated_master_keys_are_distinct_and_sized() {
        let first = MasterKeyMaterial::generate();
        let second = MasterKeyMaterial::generate();
        assert_eq!(first.expose().len(), KEY_LEN);
        assert_ne!(first.expose(), second.expose());
    }

    #[test]
    fn key_material_debug_output_is_redacted() {
        let master = MasterKeyMaterial::generate();
        let plain = PlainDataKey::new(b"123-45-6789".to_vec());
        assert!(!format!("{master:?}").contains("123"));
        assert!(format!("{plain:?}").contains("************"));
    }
}
