use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::StoreError;
use crate::models::profile::{Profile, ProfileRow};

/// Persistence for canonical profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, applicant_id: Uuid) -> Result<Option<Profile>, StoreError>;

    /// Inserts or fully replaces the applicant's profile.
    async fn upsert(&self, profile: &Profile) -> Result<(), StoreError>;
}

pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn get(&self, applicant_id: Uuid) -> Result<Option<Profile>, StoreError> {
        let row: Option<ProfileRow> = sqlx::query_as(
            r#"
            SELECT applicant_id, resume_key, skills, education, experience
            FROM profiles
            WHERE applicant_id = $1
            "#,
        )
        .bind(applicant_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Profile::try_from)
            .transpose()
            .map_err(StoreError::Corrupt)
    }

    async fn upsert(&self, profile: &Profile) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO profiles
                (applicant_id, resume_key, skills, education, experience, updated_at)
            VALUES ($1, $2, $3, $4, $5, now())
            ON CONFLICT (applicant_id) DO UPDATE SET
                resume_key = EXCLUDED.resume_key,
                skills = EXCLUDED.skills,
                education = EXCLUDED.education,
                experience = EXCLUDED.experience,
                updated_at = now()
            "#,
        )
        .bind(profile.applicant_id)
        .bind(profile.resume_ref.key())
        .bind(&profile.skills)
        .bind(Json(&profile.education))
        .bind(Json(&profile.experience))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
