use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::storage::BlobRef;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub institution: String,
    pub source_url: Option<String>,
}

/// Raw date strings as the parser reported them ("Jan 2020", "Present", ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub employer: String,
    pub source_url: Option<String>,
    pub date_range: DateRange,
}

/// Canonical candidate profile, one per applicant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub applicant_id: Uuid,
    pub resume_ref: BlobRef,
    pub skills: Vec<String>,
    pub education: Vec<Education>,
    pub experience: Vec<Experience>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub applicant_id: Uuid,
    pub resume_key: String,
    pub skills: Vec<String>,
    pub education: Json<Vec<Education>>,
    pub experience: Json<Vec<Experience>>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = String;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Profile {
            applicant_id: row.applicant_id,
            resume_ref: BlobRef::from_key(&row.resume_key)?,
            skills: row.skills,
            education: row.education.0,
            experience: row.experience.0,
        })
    }
}
