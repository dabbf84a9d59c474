use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Default upload ceiling: 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 << 20;

/// Where uploaded resume blobs are written.
#[derive(Debug, Clone)]
pub enum BlobBackendConfig {
    S3 {
        bucket: String,
        endpoint: String,
        access_key_id: String,
        secret_access_key: String,
    },
    Filesystem {
        root: PathBuf,
    },
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub blob_backend: BlobBackendConfig,
    pub parser_url: String,
    pub parser_api_key: String,
    pub parser_timeout: Duration,
    pub parser_max_attempts: u32,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            blob_backend: blob_backend_from_env()?,
            parser_url: require_env("PARSER_URL")?,
            parser_api_key: require_env("PARSER_API_KEY")?,
            parser_timeout: Duration::from_secs(parse_env("PARSER_TIMEOUT_SECS", 15)?),
            parser_max_attempts: parse_env("PARSER_MAX_ATTEMPTS", 3)?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn blob_backend_from_env() -> Result<BlobBackendConfig> {
    let kind = std::env::var("BLOB_BACKEND").unwrap_or_else(|_| "s3".to_string());
    match kind.as_str() {
        "s3" => Ok(BlobBackendConfig::S3 {
            bucket: require_env("S3_BUCKET")?,
            endpoint: require_env("S3_ENDPOINT")?,
            access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
        }),
        "filesystem" => Ok(BlobBackendConfig::Filesystem {
            root: std::env::var("BLOB_DIR")
                .unwrap_or_else(|_| "./uploads".to_string())
                .into(),
        }),
        other => bail!("BLOB_BACKEND must be 's3' or 'filesystem', got '{other}'"),
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}
