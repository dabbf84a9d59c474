pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::applications::handlers as applications;
use crate::ingestion::handlers as ingestion;
use crate::profile::handlers as profile;
use crate::state::AppState;

/// Room for multipart boundaries and headers on top of the file itself, so an
/// over-limit file is reported by the ingestion path rather than cut off
/// mid-stream.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/applicants/:applicant_id/resume",
            post(ingestion::handle_upload_resume)
                .layer(DefaultBodyLimit::max(upload_limit))
                .get(ingestion::handle_download_resume),
        )
        .route(
            "/api/v1/applicants/:applicant_id/profile",
            get(profile::handle_get_profile),
        )
        .route(
            "/api/v1/jobs/apply",
            post(applications::handle_apply).get(applications::handle_apply_query),
        )
        .with_state(state)
}
