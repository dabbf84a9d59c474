use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::db::StoreError;
use crate::locks::KeyedLocks;
use crate::models::profile::Profile;
use crate::parser_client::{ParseError, ParsingClient};
use crate::profile::{merge, ProfileStore};
use crate::storage::{BlobError, BlobStore};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("not a parseable resume: {0}")]
    InvalidDocument(String),

    #[error("resume parser unavailable: {0}")]
    Unavailable(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<BlobError> for IngestError {
    fn from(err: BlobError) -> Self {
        match err {
            BlobError::PayloadTooLarge { .. } => IngestError::PayloadTooLarge(err.to_string()),
            BlobError::NotFound(_) | BlobError::Storage(_) => IngestError::Storage(err.to_string()),
        }
    }
}

impl From<ParseError> for IngestError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::InvalidDocument(msg) => IngestError::InvalidDocument(msg),
            ParseError::Unavailable(msg) => IngestError::Unavailable(msg),
            ParseError::Timeout(after) => {
                IngestError::Unavailable(format!("resume parser timed out after {after:?}"))
            }
        }
    }
}

impl From<StoreError> for IngestError {
    fn from(err: StoreError) -> Self {
        IngestError::Storage(err.to_string())
    }
}

/// Runs upload → store → parse → merge → persist for one applicant at a time.
///
/// Requests for the same applicant queue behind each other in arrival order;
/// different applicants proceed in parallel. A failure at any step leaves the
/// stored profile exactly as it was. Blobs written before a failed parse stay
/// in storage.
pub struct IngestionCoordinator {
    blobs: BlobStore,
    parser: ParsingClient,
    profiles: Arc<dyn ProfileStore>,
    locks: KeyedLocks<Uuid>,
}

impl IngestionCoordinator {
    pub fn new(blobs: BlobStore, parser: ParsingClient, profiles: Arc<dyn ProfileStore>) -> Self {
        Self {
            blobs,
            parser,
            profiles,
            locks: KeyedLocks::new(),
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.blobs.max_bytes()
    }

    /// Bytes of the resume the applicant's profile currently points at, or
    /// `None` if nothing has been ingested for them yet.
    pub async fn current_resume(&self, applicant_id: Uuid) -> Result<Option<Bytes>, IngestError> {
        let Some(profile) = self.profiles.get(applicant_id).await? else {
            return Ok(None);
        };
        Ok(Some(self.blobs.get(&profile.resume_ref).await?))
    }

    #[instrument(skip(self, document), fields(size = document.len()))]
    pub async fn ingest(&self, applicant_id: Uuid, document: Bytes) -> Result<Profile, IngestError> {
        self.blobs.check_size(document.len())?;
        if document.is_empty() {
            return Err(IngestError::InvalidDocument(
                "uploaded file is empty".to_string(),
            ));
        }

        let _guard = self.locks.acquire(applicant_id).await;

        let blob = self.blobs.put(applicant_id, &document).await?;
        let parsed = self.parser.parse(&blob, document).await?;

        let existing = self.profiles.get(applicant_id).await?;
        let profile = merge(existing.as_ref(), &parsed);
        if existing.as_ref() == Some(&profile) {
            debug!(%blob, "profile unchanged by ingestion");
            return Ok(profile);
        }

        self.profiles.upsert(&profile).await?;
        info!(
            %blob,
            skills = profile.skills.len(),
            education = profile.education.len(),
            experience = profile.experience.len(),
            "profile updated from resume"
        );
        Ok(profile)
    }
}
