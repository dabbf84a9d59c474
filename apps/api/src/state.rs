use std::sync::Arc;

use crate::applications::ApplicationRegistrar;
use crate::config::Config;
use crate::ingestion::IngestionCoordinator;
use crate::profile::ProfileStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub ingestion: Arc<IngestionCoordinator>,
    pub registrar: Arc<ApplicationRegistrar>,
    /// Read side of the canonical profiles; writes go through `ingestion`.
    pub profiles: Arc<dyn ProfileStore>,
}
