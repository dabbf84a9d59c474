use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use uuid::Uuid;

use crate::errors::AppError;
use crate::ingestion::coordinator::IngestError;
use crate::models::profile::Profile;
use crate::state::AppState;

/// Multipart form field carrying the resume file.
pub const RESUME_FIELD: &str = "resume";

/// POST /api/v1/applicants/:applicant_id/resume
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    Path(applicant_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<Profile>, AppError> {
    let limit = state.ingestion.max_upload_bytes();
    let document = read_resume_field(&mut multipart, limit).await?;
    let profile = state.ingestion.ingest(applicant_id, document).await?;
    Ok(Json(profile))
}

/// GET /api/v1/applicants/:applicant_id/resume
///
/// Streams back the resume file the applicant's profile was built from.
pub async fn handle_download_resume(
    State(state): State<AppState>,
    Path(applicant_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let document = state
        .ingestion
        .current_resume(applicant_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No resume on file for applicant {applicant_id}")))?;
    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], document))
}

async fn read_resume_field(multipart: &mut Multipart, limit: usize) -> Result<Bytes, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() == Some(RESUME_FIELD) {
            return field.bytes().await.map_err(|e| multipart_error(e, limit));
        }
    }
    Err(AppError::Validation(format!(
        "multipart field '{RESUME_FIELD}' is required"
    )))
}

fn multipart_error(err: MultipartError, limit: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::Ingest(IngestError::PayloadTooLarge(format!(
            "upload exceeds the {limit} byte limit"
        )))
    } else {
        AppError::Validation(format!("malformed multipart body: {}", err.body_text()))
    }
}
