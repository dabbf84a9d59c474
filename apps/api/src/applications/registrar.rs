//! Application Registrar — idempotent job applications.
//!
//! Applying twice to the same job is not an error: the second call gets the
//! original record back with `already_applied = true`. Calls for one
//! (applicant, job) pair are serialized in-process; the store's transaction
//! keeps the record and the job counter in step.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::applications::store::{ApplicationStore, NewApplication};
use crate::db::StoreError;
use crate::locks::KeyedLocks;
use crate::models::application::Application;
use crate::profile::ProfileStore;

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("job {0} not found")]
    JobNotFound(Uuid),

    #[error(transparent)]
    Storage(StoreError),
}

impl From<StoreError> for ApplyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::JobNotFound(job_id) => ApplyError::JobNotFound(job_id),
            other => ApplyError::Storage(other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    pub application: Application,
    pub already_applied: bool,
    pub total_applications: i64,
}

pub struct ApplicationRegistrar {
    applications: Arc<dyn ApplicationStore>,
    profiles: Arc<dyn ProfileStore>,
    locks: KeyedLocks<(Uuid, Uuid)>,
}

impl ApplicationRegistrar {
    pub fn new(applications: Arc<dyn ApplicationStore>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self {
            applications,
            profiles,
            locks: KeyedLocks::new(),
        }
    }

    #[instrument(skip(self))]
    pub async fn apply(&self, applicant_id: Uuid, job_id: Uuid) -> Result<ApplyOutcome, ApplyError> {
        let _guard = self.locks.acquire((applicant_id, job_id)).await;

        let resume_key = self
            .profiles
            .get(applicant_id)
            .await?
            .map(|profile| profile.resume_ref.key());

        let recorded = self
            .applications
            .record(NewApplication {
                applicant_id,
                job_id,
                resume_key,
            })
            .await?;

        if recorded.created {
            info!(
                application_id = %recorded.application.id,
                total_applications = recorded.job.total_applications,
                "application recorded"
            );
        } else {
            debug!(application_id = %recorded.application.id, "already applied");
        }

        Ok(ApplyOutcome {
            application: recorded.application,
            already_applied: !recorded.created,
            total_applications: recorded.job.total_applications,
        })
    }
}
