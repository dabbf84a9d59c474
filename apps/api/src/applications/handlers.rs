use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::Application;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    #[serde(alias = "applicant_id")]
    pub applicant_id: Uuid,
    #[serde(alias = "job_id")]
    pub job_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResponse {
    #[serde(flatten)]
    pub application: Application,
    pub already_applied: bool,
    pub total_applications: i64,
}

/// POST /api/v1/jobs/apply
pub async fn handle_apply(
    State(state): State<AppState>,
    Json(req): Json<ApplyRequest>,
) -> Result<Json<ApplyResponse>, AppError> {
    apply(&state, req).await
}

/// GET /api/v1/jobs/apply?applicantId=..&jobId=..
///
/// Query-string form of the same call, for clients that apply through a link.
pub async fn handle_apply_query(
    State(state): State<AppState>,
    Query(req): Query<ApplyRequest>,
) -> Result<Json<ApplyResponse>, AppError> {
    apply(&state, req).await
}

async fn apply(state: &AppState, req: ApplyRequest) -> Result<Json<ApplyResponse>, AppError> {
    let outcome = state.registrar.apply(req.applicant_id, req.job_id).await?;
    Ok(Json(ApplyResponse {
        application: outcome.application,
        already_applied: outcome.already_applied,
        total_applications: outcome.total_applications,
    }))
}
