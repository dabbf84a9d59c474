use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub company_name: String,
    pub posted_by: Uuid,
    pub posted_on: DateTime<Utc>,
    pub total_applications: i64,
}

/// One applicant's application to one job. Never updated after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: Uuid,
    pub applicant_id: Uuid,
    pub job_id: Uuid,
    /// Storage key of the resume on file when the application was made.
    pub resume_key: Option<String>,
    pub applied_at: DateTime<Utc>,
}
