use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::StoreError;
use crate::models::application::{Application, Job};

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub applicant_id: Uuid,
    pub job_id: Uuid,
    pub resume_key: Option<String>,
}

/// Result of recording an application: either a fresh record (and the job
/// with its counter already bumped) or the record that was already there.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub application: Application,
    pub job: Job,
    pub created: bool,
}

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Creates the application and increments the job's counter as one unit,
    /// or returns the existing application for the pair untouched.
    async fn record(&self, new: NewApplication) -> Result<Recorded, StoreError>;
}

pub struct PgApplicationStore {
    pool: PgPool,
}

impl PgApplicationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApplicationStore for PgApplicationStore {
    async fn record(&self, new: NewApplication) -> Result<Recorded, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Row lock scoped to this job; other jobs' counters are unaffected.
        let job: Option<Job> = sqlx::query_as(
            r#"
            SELECT id, title, description, company_name, posted_by, posted_on, total_applications
            FROM jobs
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(new.job_id)
        .fetch_optional(&mut *tx)
        .await?;
        let job = job.ok_or(StoreError::JobNotFound(new.job_id))?;

        let inserted: Option<Application> = sqlx::query_as(
            r#"
            INSERT INTO applications (id, applicant_id, job_id, resume_key, applied_at)
            VALUES ($1, $2, $3, $4, now())
            ON CONFLICT (applicant_id, job_id) DO NOTHING
            RETURNING id, applicant_id, job_id, resume_key, applied_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.applicant_id)
        .bind(new.job_id)
        .bind(&new.resume_key)
        .fetch_optional(&mut *tx)
        .await?;

        let recorded = match inserted {
            Some(application) => {
                let job: Job = sqlx::query_as(
                    r#"
                    UPDATE jobs
                    SET total_applications = total_applications + 1
                    WHERE id = $1
                    RETURNING id, title, description, company_name, posted_by, posted_on, total_applications
                    "#,
                )
                .bind(new.job_id)
                .fetch_one(&mut *tx)
                .await?;
                Recorded {
                    application,
                    job,
                    created: true,
                }
            }
            None => {
                let application: Application = sqlx::query_as(
                    r#"
                    SELECT id, applicant_id, job_id, resume_key, applied_at
                    FROM applications
                    WHERE applicant_id = $1 AND job_id = $2
                    "#,
                )
                .bind(new.applicant_id)
                .bind(new.job_id)
                .fetch_one(&mut *tx)
                .await?;
                Recorded {
                    application,
                    job,
                    created: false,
                }
            }
        };

        tx.commit().await?;
        Ok(recorded)
    }
}
