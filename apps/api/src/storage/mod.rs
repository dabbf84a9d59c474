//! Resume blob storage.
//!
//! Blobs are content-addressed per applicant: the key is
//! `resumes/{applicant_id}/{sha256}.bin`, so identical re-uploads land on the
//! same key and are skipped, and no two applicants ever share a key.

pub mod filesystem;
pub mod s3;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

const KEY_PREFIX: &str = "resumes/";
const KEY_SUFFIX: &str = ".bin";

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("upload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("blob not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Stable identifier of a stored resume.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlobRef {
    applicant_id: Uuid,
    digest: String,
}

impl BlobRef {
    pub fn for_content(applicant_id: Uuid, data: &[u8]) -> Self {
        Self {
            applicant_id,
            digest: hex::encode(Sha256::digest(data)),
        }
    }

    pub fn from_key(key: &str) -> Result<Self, String> {
        let invalid = || format!("malformed blob key '{key}'");
        let rest = key
            .strip_prefix(KEY_PREFIX)
            .and_then(|k| k.strip_suffix(KEY_SUFFIX))
            .ok_or_else(invalid)?;
        let (applicant, digest) = rest.split_once('/').ok_or_else(invalid)?;
        let applicant_id = Uuid::parse_str(applicant).map_err(|_| invalid())?;
        if digest.len() != 64 || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        Ok(Self {
            applicant_id,
            digest: digest.to_ascii_lowercase(),
        })
    }

    pub fn applicant_id(&self) -> Uuid {
        self.applicant_id
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn key(&self) -> String {
        format!("{KEY_PREFIX}{}/{}{KEY_SUFFIX}", self.applicant_id, self.digest())
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl From<BlobRef> for String {
    fn from(blob: BlobRef) -> Self {
        blob.key()
    }
}

impl TryFrom<String> for BlobRef {
    type Error = String;

    fn try_from(key: String) -> Result<Self, Self::Error> {
        BlobRef::from_key(&key)
    }
}

/// Raw byte storage underneath [`BlobStore`]. Implemented for S3/MinIO and
/// the local filesystem.
#[async_trait]
pub trait BlobBackend: Send + Sync {
    async fn write(&self, key: &str, data: &[u8]) -> Result<(), BlobError>;

    /// Fails with [`BlobError::NotFound`] when nothing is stored at `key`.
    async fn read(&self, key: &str) -> Result<Bytes, BlobError>;

    async fn exists(&self, key: &str) -> Result<bool, BlobError>;
}

#[derive(Clone)]
pub struct BlobStore {
    backend: Arc<dyn BlobBackend>,
    max_bytes: usize,
}

impl BlobStore {
    pub fn new(backend: Arc<dyn BlobBackend>, max_bytes: usize) -> Self {
        Self { backend, max_bytes }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Fails fast, before any I/O, when `data` is over the size ceiling.
    pub fn check_size(&self, size: usize) -> Result<(), BlobError> {
        if size > self.max_bytes {
            return Err(BlobError::PayloadTooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Stores `data` for `applicant_id`. Storing bytes that are already on
    /// file returns the existing ref without writing.
    pub async fn put(&self, applicant_id: Uuid, data: &[u8]) -> Result<BlobRef, BlobError> {
        self.check_size(data.len())?;

        let blob = BlobRef::for_content(applicant_id, data);
        let key = blob.key();
        if self.backend.exists(&key).await? {
            debug!(%key, "blob already stored, skipping write");
            return Ok(blob);
        }

        self.backend.write(&key, data).await?;
        info!(%key, size = data.len(), "stored resume blob");
        Ok(blob)
    }

    pub async fn get(&self, blob: &BlobRef) -> Result<Bytes, BlobError> {
        self.backend.read(&blob.key()).await
    }
}
