use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::warn;

use super::{BlobBackend, BlobError};

/// Local-disk blob backend. Writes go to a temp file that is renamed into
/// place, so a reader never sees a half-written resume.
pub struct FilesystemBackend {
    root: PathBuf,
}

impl FilesystemBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Round-trips a small file under the root so permission problems show up
    /// at startup instead of on the first upload.
    pub async fn validate(&self) -> Result<(), BlobError> {
        let probe = self.root.join(".health-check");
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| io_error("create_dir_all", &self.root, e))?;
        fs::write(&probe, b"ok")
            .await
            .map_err(|e| io_error("write", &probe, e))?;
        fs::remove_file(&probe)
            .await
            .map_err(|e| io_error("remove_file", &probe, e))?;
        Ok(())
    }

    fn full_path(&self, key: &str) -> Result<PathBuf, BlobError> {
        let relative = Path::new(key);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(BlobError::Storage(format!("refusing unsafe blob key '{key}'")));
        }
        Ok(self.root.join(relative))
    }
}

fn io_error(op: &str, path: &Path, err: std::io::Error) -> BlobError {
    BlobError::Storage(format!("{op}({}): {err}", path.display()))
}

#[async_trait]
impl BlobBackend for FilesystemBackend {
    async fn write(&self, key: &str, data: &[u8]) -> Result<(), BlobError> {
        let full_path = self.full_path(key)?;
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error("create_dir_all", parent, e))?;
        }

        let temp_path = full_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| io_error("create", &temp_path, e))?;
        file.write_all(data)
            .await
            .map_err(|e| io_error("write_all", &temp_path, e))?;
        file.sync_all()
            .await
            .map_err(|e| io_error("sync_all", &temp_path, e))?;
        drop(file);

        if let Err(e) = fs::rename(&temp_path, &full_path).await {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "blob rename failed");
            let _ = fs::remove_file(&temp_path).await;
            return Err(io_error("rename", &full_path, e));
        }
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Bytes, BlobError> {
        let full_path = self.full_path(key)?;
        match fs::read(&full_path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(BlobError::NotFound(key.to_string())),
            Err(e) => Err(io_error("read", &full_path, e)),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, BlobError> {
        let full_path = self.full_path(key)?;
        fs::try_exists(&full_path)
            .await
            .map_err(|e| io_error("try_exists", &full_path, e))
    }
}
