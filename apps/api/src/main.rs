mod applications;
mod config;
mod db;
mod errors;
mod ingestion;
mod locks;
mod models;
mod parser_client;
mod profile;
mod routes;
mod state;
mod storage;
#[cfg(test)]
mod testing;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::applications::{ApplicationRegistrar, PgApplicationStore};
use crate::config::{BlobBackendConfig, Config};
use crate::db::create_pool;
use crate::ingestion::IngestionCoordinator;
use crate::parser_client::http::HttpResumeParser;
use crate::parser_client::{ParsingClient, RetryPolicy};
use crate::profile::{PgProfileStore, ProfileStore};
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::filesystem::FilesystemBackend;
use crate::storage::s3::S3Backend;
use crate::storage::{BlobBackend, BlobStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting job board API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize blob storage
    let blob_backend = build_blob_backend(&config.blob_backend).await?;
    let blobs = BlobStore::new(blob_backend, config.max_upload_bytes);

    // Initialize resume parser client
    let parser_api = HttpResumeParser::new(
        config.parser_url.clone(),
        config.parser_api_key.clone(),
        config.parser_timeout,
    )?;
    let parser = ParsingClient::new(
        Arc::new(parser_api),
        RetryPolicy {
            max_attempts: config.parser_max_attempts,
            attempt_timeout: config.parser_timeout,
            ..RetryPolicy::default()
        },
    );
    info!(
        "Resume parser client initialized ({}, {} attempts, {:?} timeout)",
        config.parser_url, config.parser_max_attempts, config.parser_timeout
    );

    let profiles: Arc<dyn ProfileStore> = Arc::new(PgProfileStore::new(db.clone()));
    let ingestion = IngestionCoordinator::new(blobs, parser, profiles.clone());
    let registrar =
        ApplicationRegistrar::new(Arc::new(PgApplicationStore::new(db)), profiles.clone());

    // Build app state
    let state = AppState {
        config: config.clone(),
        ingestion: Arc::new(ingestion),
        registrar: Arc::new(registrar),
        profiles,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client's domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_blob_backend(config: &BlobBackendConfig) -> Result<Arc<dyn BlobBackend>> {
    match config {
        BlobBackendConfig::S3 {
            bucket,
            endpoint,
            access_key_id,
            secret_access_key,
        } => {
            let backend = S3Backend::connect(endpoint, bucket, access_key_id, secret_access_key).await;
            info!("S3 blob storage initialized (bucket: {bucket})");
            Ok(Arc::new(backend))
        }
        BlobBackendConfig::Filesystem { root } => {
            let backend = FilesystemBackend::new(root.clone());
            backend.validate().await?;
            info!("Filesystem blob storage initialized at {}", root.display());
            Ok(Arc::new(backend))
        }
    }
}
