//! Root key acquisition.
//!
//! The root key is the top tier of the hierarchy. It is owned by an external
//! source and only ever borrowed for the duration of a single request; the
//! material is zeroised as soon as the request drops it.
//!
//! Two sources are provided: a local key file for development and single-node
//! deployments, and AWS KMS, where the service holds a KMS-wrapped root key
//! blob and calls `Decrypt` per request.

use std::path::PathBuf;

use base64::Engine;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::WardenError;

/// Root key length in bytes (256 bits).
pub const ROOT_KEY_LEN: usize = 32;

/// Root key bytes, zeroised on drop. Never serialized, never logged.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct RootKeyMaterial(Vec<u8>);

impl RootKeyMaterial {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub(crate) fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for RootKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RootKeyMaterial(************)")
    }
}

#[async_trait::async_trait]
pub trait RootKeySourceLike: Send + Sync {
    /// Fetch the current root key. A failure here is terminal for the
    /// request but not for the process.
    async fn root_key(&self) -> Result<RootKeyMaterial, WardenError>;
}

// ---------------------------------------------------------------------------
// Local key file
// ---------------------------------------------------------------------------

/// Root key stored as a raw 32-byte file on local disk. The file is created
/// with fresh random bytes on first use.
pub struct LocalFileRootKeySource {
    path: PathBuf,
}

impl LocalFileRootKeySource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait::async_trait]
impl RootKeySourceLike for LocalFileRootKeySource {
    async fn root_key(&self) -> Result<RootKeyMaterial, WardenError> {
        if self.path.exists() {
            let key_bytes = std::fs::read(&self.path).map_err(|e| WardenError::Dependency {
                msg: "root key source".to_string(),
                source: Some(anyhow::anyhow!(
                    "failed to read root key file at {}: {e}",
                    self.path.display()
                )),
            })?;

            if key_bytes.len() != ROOT_KEY_LEN {
                return Err(WardenError::Dependency {
                    msg: "root key source".to_string(),
                    source: Some(anyhow::anyhow!(
                        "invalid root key length in file {} (expected {ROOT_KEY_LEN} bytes, got {})",
                        self.path.display(),
                        key_bytes.len()
                    )),
                });
            }

            return Ok(RootKeyMaterial::new(key_bytes));
        }

        // File doesn't exist - generate a new key
        let mut key_bytes = vec![0u8; ROOT_KEY_LEN];
        rand::thread_rng().fill_bytes(&mut key_bytes);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| WardenError::Dependency {
                msg: "root key source".to_string(),
                source: Some(anyhow::anyhow!(
                    "failed to create parent directory for root key file at {}: {e}",
                    self.path.display()
                )),
            })?;
        }

        std::fs::write(&self.path, &key_bytes).map_err(|e| WardenError::Dependency {
            msg: "root key source".to_string(),
            source: Some(anyhow::anyhow!(
                "failed to write root key file at {}: {e}",
                self.path.display()
            )),
        })?;

        Ok(RootKeyMaterial::new(key_bytes))
    }
}

// ---------------------------------------------------------------------------
// AWS KMS
// ---------------------------------------------------------------------------

/// Root key protected by AWS KMS. The service never sees the KMS key itself;
/// it holds a wrapped root key blob (produced by [`AwsKmsRootKeySource::provision`])
/// and asks KMS to decrypt it on every request.
pub struct AwsKmsRootKeySource {
    key_arn: String,
    region: String,
    wrapped_root_key: String,
}

impl AwsKmsRootKeySource {
    pub fn new(key_arn: String, region: String, wrapped_root_key: String) -> Self {
        Self {
            key_arn,
            region,
            wrapped_root_key,
        }
    }

    /// Generate a fresh root key under the given KMS key and return the
    /// wrapped blob (base64) for storage. The plaintext half of the KMS
    /// response is discarded.
    pub async fn provision(key_arn: &str, region: &str) -> Result<String, WardenError> {
        let kms_client = kms_client(region).await;

        let output = kms_client
            .generate_data_key()
            .key_id(key_arn)
            .key_spec(aws_sdk_kms::types::DataKeySpec::Aes256)
            .send()
            .await
            .map_err(|e| WardenError::Dependency {
                msg: "kms root key source".to_string(),
                source: Some(anyhow::anyhow!(
                    "failed to generate root key with AWS KMS: {e}"
                )),
            })?;

        let ciphertext_blob = output.ciphertext_blob().ok_or_else(|| {
            WardenError::Dependency {
                msg: "kms root key source".to_string(),
                source: Some(anyhow::anyhow!(
                    "AWS KMS GenerateDataKey response did not contain ciphertext blob"
                )),
            }
        })?;

        Ok(base64::engine::general_purpose::STANDARD.encode(ciphertext_blob.as_ref()))
    }
}

#[async_trait::async_trait]
impl RootKeySourceLike for AwsKmsRootKeySource {
    async fn root_key(&self) -> Result<RootKeyMaterial, WardenError> {
        let kms_client = kms_client(&self.region).await;

        let ciphertext_blob = base64::engine::general_purpose::STANDARD
            .decode(&self.wrapped_root_key)
            .map_err(|e| WardenError::Dependency {
                msg: "kms root key source".to_string(),
                source: Some(anyhow::anyhow!(
                    "failed to decode base64 wrapped root key: {e}"
                )),
            })?;

        let output = kms_client
            .decrypt()
            .key_id(&self.key_arn)
            .ciphertext_blob(aws_sdk_kms::primitives::Blob::new(ciphertext_blob))
            .send()
            .await
            .map_err(|e| WardenError::Dependency {
                msg: "kms root key source".to_string(),
                source: Some(anyhow::anyhow!("failed to decrypt root key with AWS KMS: {e}")),
            })?;

        let plaintext = output.plaintext().ok_or_else(|| WardenError::Dependency {
            msg: "kms root key source".to_string(),
            source: Some(anyhow::anyhow!(
                "AWS KMS Decrypt response did not contain plaintext"
            )),
        })?;

        Ok(RootKeyMaterial::new(plaintext.as_ref().to_vec()))
    }
}

async fn kms_client(region: &str) -> aws_sdk_kms::Client {
    let mut config = aws_config::load_from_env().await;
    config = config
        .to_builder()
        .region(aws_config::Region::new(region.to_string()))
        .build();
    aws_sdk_kms::Client::new(&config)
}
