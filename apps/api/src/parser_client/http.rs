use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::response::ParserResponse;
use super::{ParseError, ResumeParserApi};
use crate::storage::BlobRef;

#[derive(Debug, Deserialize)]
struct ParserErrorBody {
    message: String,
}

/// Talks to the resume parsing service over HTTP: the raw file goes up as the
/// request body, the structured resume comes back as JSON.
pub struct HttpResumeParser {
    client: Client,
    url: String,
    api_key: String,
    timeout: Duration,
}

impl HttpResumeParser {
    pub fn new(url: String, api_key: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            url,
            api_key,
            timeout,
        })
    }

    fn classify_transport_error(&self, err: reqwest::Error) -> ParseError {
        if err.is_timeout() {
            ParseError::Timeout(self.timeout)
        } else {
            ParseError::Unavailable(format!("request to resume parser failed: {err}"))
        }
    }
}

/// Maps a non-2xx parser status onto our error kinds. Statuses that describe
/// the document are terminal; everything else is treated as a service fault.
fn classify_status(status: StatusCode, body: &str) -> ParseError {
    let message = serde_json::from_str::<ParserErrorBody>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.to_string());

    match status {
        StatusCode::BAD_REQUEST
        | StatusCode::PAYLOAD_TOO_LARGE
        | StatusCode::UNSUPPORTED_MEDIA_TYPE
        | StatusCode::UNPROCESSABLE_ENTITY => ParseError::InvalidDocument(message),
        _ => ParseError::Unavailable(format!("resume parser returned {status}: {message}")),
    }
}

#[async_trait]
impl ResumeParserApi for HttpResumeParser {
    async fn parse_document(
        &self,
        blob: &BlobRef,
        document: Bytes,
    ) -> Result<ParserResponse, ParseError> {
        debug!(%blob, size = document.len(), "sending resume to parser");

        let response = self
            .client
            .post(&self.url)
            .header("apikey", &self.api_key)
            .header("content-type", "application/octet-stream")
            .body(document)
            .send()
            .await
            .map_err(|e| self.classify_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        response
            .json::<ParserResponse>()
            .await
            .map_err(|e| ParseError::Unavailable(format!("undecodable parser response: {e}")))
    }
}
