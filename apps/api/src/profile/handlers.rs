use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::Profile;
use crate::state::AppState;

/// GET /api/v1/applicants/:applicant_id/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Path(applicant_id): Path<Uuid>,
) -> Result<Json<Profile>, AppError> {
    let profile = state
        .profiles
        .get(applicant_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No profile for applicant {applicant_id}")))?;
    Ok(Json(profile))
}
