/// Parsing Client — the only path from a stored resume to the external parser.
///
/// The transport (`ResumeParserApi`) makes exactly one attempt. Retry,
/// backoff, per-attempt timeouts and response validation all live in
/// `ParsingClient`, so a test double only has to script single responses.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, warn};

use crate::storage::BlobRef;

pub mod http;
pub mod response;

pub use response::{ParsedResume, ParserResponse};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("resume parser unavailable: {0}")]
    Unavailable(String),

    #[error("not a parseable resume: {0}")]
    InvalidDocument(String),

    #[error("resume parser timed out after {0:?}")]
    Timeout(Duration),
}

impl ParseError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ParseError::Unavailable(_) | ParseError::Timeout(_))
    }
}

/// A single call to the external resume parser.
#[async_trait]
pub trait ResumeParserApi: Send + Sync {
    async fn parse_document(
        &self,
        blob: &BlobRef,
        document: Bytes,
    ) -> Result<ParserResponse, ParseError>;
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub factor: u32,
    /// Fraction of the nominal delay added or removed at random (0.2 = ±20%).
    pub jitter: f64,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            factor: 2,
            jitter: 0.2,
            attempt_timeout: Duration::from_secs(15),
        }
    }
}

impl RetryPolicy {
    /// Delay before the `retry`-th retry (1-based). `sample` in `[-1.0, 1.0]`
    /// picks where inside the jitter band the delay lands.
    pub fn backoff(&self, retry: u32, sample: f64) -> Duration {
        let exponent = retry.saturating_sub(1);
        let nominal = self
            .base_delay
            .saturating_mul(self.factor.saturating_pow(exponent));
        let scale = (1.0 + self.jitter * sample.clamp(-1.0, 1.0)).max(0.0);
        Duration::from_nanos((nominal.as_nanos() as f64 * scale).round() as u64)
    }
}

#[derive(Clone)]
pub struct ParsingClient {
    api: Arc<dyn ResumeParserApi>,
    policy: RetryPolicy,
}

impl ParsingClient {
    pub fn new(api: Arc<dyn ResumeParserApi>, policy: RetryPolicy) -> Self {
        Self { api, policy }
    }

    /// Parses the stored resume `blob`, whose bytes are `document`.
    ///
    /// `Unavailable` and `Timeout` are retried with jittered exponential
    /// backoff; `InvalidDocument` is returned after the first attempt. When
    /// attempts run out the error is `Unavailable`.
    pub async fn parse(&self, blob: &BlobRef, document: Bytes) -> Result<ParsedResume, ParseError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error: Option<ParseError> = None;

        for attempt in 1..=max_attempts {
            if let Some(err) = &last_error {
                let sample = rand::thread_rng().gen_range(-1.0..=1.0);
                let delay = self.policy.backoff(attempt - 1, sample);
                warn!(
                    %blob,
                    attempt = attempt - 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "resume parse failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }

            let outcome = match tokio::time::timeout(
                self.policy.attempt_timeout,
                self.api.parse_document(blob, document.clone()),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(ParseError::Timeout(self.policy.attempt_timeout)),
            };

            match outcome.and_then(|response| response.validate(blob.clone())) {
                Ok(parsed) => {
                    debug!(
                        %blob,
                        attempt,
                        skills = parsed.skills.len(),
                        has_name = parsed.name.is_some(),
                        has_email = parsed.email.is_some(),
                        has_phone = parsed.phone.is_some(),
                        "resume parsed"
                    );
                    return Ok(parsed);
                }
                Err(err) if err.is_retryable() => last_error = Some(err),
                Err(err) => return Err(err),
            }
        }

        let cause = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempt made".to_string());
        Err(ParseError::Unavailable(format!(
            "gave up after {max_attempts} attempts: {cause}"
        )))
    }
}
