use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;

use super::{BlobBackend, BlobError};

/// S3 / MinIO blob backend.
pub struct S3Backend {
    client: Client,
    bucket: String,
}

impl S3Backend {
    /// Constructs an S3 client configured for MinIO (local) or AWS (production).
    pub async fn connect(
        endpoint: &str,
        bucket: &str,
        access_key_id: &str,
        secret_access_key: &str,
    ) -> Self {
        let credentials =
            Credentials::new(access_key_id, secret_access_key, None, None, "jobboard-static");

        let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .load()
            .await;

        Self {
            client: Client::new(&s3_config),
            bucket: bucket.to_string(),
        }
    }
}

#[async_trait]
impl BlobBackend for S3Backend {
    async fn write(&self, key: &str, data: &[u8]) -> Result<(), BlobError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data.to_vec()))
            .content_type("application/octet-stream")
            .send()
            .await
            .map_err(|e| BlobError::Storage(format!("S3 upload of {key} failed: {e}")))?;
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Bytes, BlobError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    BlobError::NotFound(key.to_string())
                } else {
                    BlobError::Storage(format!("S3 download of {key} failed: {e}"))
                }
            })?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| BlobError::Storage(format!("S3 body read of {key} failed: {e}")))?;
        Ok(body.into_bytes())
    }

    async fn exists(&self, key: &str) -> Result<bool, BlobError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => Err(BlobError::Storage(format!("S3 head of {key} failed: {e}"))),
        }
    }
}
