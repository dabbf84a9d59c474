//! In-memory doubles for the storage, parser and repository seams, plus a
//! fully wired `AppState` for route tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tokio::time::Instant;
use uuid::Uuid;

use crate::applications::store::{ApplicationStore, NewApplication, Recorded};
use crate::applications::ApplicationRegistrar;
use crate::config::{BlobBackendConfig, Config};
use crate::db::StoreError;
use crate::ingestion::IngestionCoordinator;
use crate::models::application::{Application, Job};
use crate::models::profile::Profile;
use crate::parser_client::{
    ParseError, ParsedResume, ParserResponse, ParsingClient, ResumeParserApi, RetryPolicy,
};
use crate::profile::ProfileStore;
use crate::state::AppState;
use crate::storage::{BlobBackend, BlobError, BlobRef, BlobStore};

pub fn resume_response(skills: &[&str]) -> ParserResponse {
    ParserResponse {
        name: Some("Test Applicant".to_string()),
        skills: Some(skills.iter().map(|s| s.to_string()).collect()),
        ..Default::default()
    }
}

/// A "resume" that [`FakeParser::echo`] understands: the parser response
/// itself, serialized as JSON.
pub fn resume_document(skills: &[&str]) -> Bytes {
    Bytes::from(serde_json::to_vec(&resume_response(skills)).unwrap())
}

pub fn parsed_resume(applicant_id: Uuid, document: &[u8], skills: &[&str]) -> ParsedResume {
    resume_response(skills)
        .validate(BlobRef::for_content(applicant_id, document))
        .unwrap()
}

#[derive(Default)]
pub struct MemoryBlobBackend {
    blobs: Mutex<HashMap<String, Bytes>>,
    writes: AtomicUsize,
}

impl MemoryBlobBackend {
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobBackend for MemoryBlobBackend {
    async fn write(&self, key: &str, data: &[u8]) -> Result<(), BlobError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.blobs
            .lock()
            .unwrap()
            .insert(key.to_string(), Bytes::copy_from_slice(data));
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Bytes, BlobError> {
        self.blobs
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| BlobError::NotFound(key.to_string()))
    }

    async fn exists(&self, key: &str) -> Result<bool, BlobError> {
        Ok(self.blobs.lock().unwrap().contains_key(key))
    }
}

pub enum Step {
    Respond(ParserResponse),
    Fail(ParseError),
    /// Never answers; the client's attempt timeout has to fire.
    Hang,
}

/// Scripted resume parser. Scripted steps are consumed first; after that the
/// document bytes are decoded as a JSON `ParserResponse`, and anything that
/// is not valid JSON is an invalid document.
pub struct FakeParser {
    script: Mutex<VecDeque<Step>>,
    latency: Duration,
    calls: Mutex<Vec<Instant>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeParser {
    pub fn scripted(steps: Vec<Step>) -> Self {
        Self {
            script: Mutex::new(steps.into()),
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn echo() -> Self {
        Self::scripted(Vec::new())
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResumeParserApi for FakeParser {
    async fn parse_document(
        &self,
        _blob: &BlobRef,
        document: Bytes,
    ) -> Result<ParserResponse, ParseError> {
        self.calls.lock().unwrap().push(Instant::now());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        let step = self.script.lock().unwrap().pop_front();

        // Give other tasks a chance to run while this call is outstanding.
        tokio::task::yield_now().await;
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match step {
            Some(Step::Respond(response)) => Ok(response),
            Some(Step::Fail(err)) => Err(err),
            Some(Step::Hang) => {
                tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
                Err(ParseError::Unavailable("hung call returned".to_string()))
            }
            None => serde_json::from_slice(&document)
                .map_err(|e| ParseError::InvalidDocument(e.to_string())),
        }
    }
}

#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: Mutex<HashMap<Uuid, Profile>>,
    upserts: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryProfileStore {
    pub fn insert(&self, profile: Profile) {
        self.profiles
            .lock()
            .unwrap()
            .insert(profile.applicant_id, profile);
    }

    pub fn profile(&self, applicant_id: Uuid) -> Option<Profile> {
        self.profiles.lock().unwrap().get(&applicant_id).cloned()
    }

    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get(&self, applicant_id: Uuid) -> Result<Option<Profile>, StoreError> {
        Ok(self.profile(applicant_id))
    }

    async fn upsert(&self, profile: &Profile) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.insert(profile.clone());
        Ok(())
    }
}

#[derive(Default)]
struct ApplicationTables {
    jobs: HashMap<Uuid, Job>,
    applications: HashMap<(Uuid, Uuid), Application>,
}

/// Deliberately check-then-act with a yield in between, so two unserialized
/// callers for the same pair would both insert. Only the registrar's
/// per-pair lock keeps it consistent.
#[derive(Default)]
pub struct MemoryApplicationStore {
    tables: Mutex<ApplicationTables>,
}

impl MemoryApplicationStore {
    pub fn add_job(&self, title: &str) -> Uuid {
        let job = Job {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: String::new(),
            company_name: "Acme".to_string(),
            posted_by: Uuid::new_v4(),
            posted_on: Utc::now(),
            total_applications: 0,
        };
        let id = job.id;
        self.tables.lock().unwrap().jobs.insert(id, job);
        id
    }

    pub fn total_applications(&self, job_id: Uuid) -> Option<i64> {
        self.tables
            .lock()
            .unwrap()
            .jobs
            .get(&job_id)
            .map(|job| job.total_applications)
    }

    pub fn application_count(&self) -> usize {
        self.tables.lock().unwrap().applications.len()
    }
}

#[async_trait]
impl ApplicationStore for MemoryApplicationStore {
    async fn record(&self, new: NewApplication) -> Result<Recorded, StoreError> {
        let key = (new.applicant_id, new.job_id);
        let existing = {
            let tables = self.tables.lock().unwrap();
            let job = tables
                .jobs
                .get(&new.job_id)
                .cloned()
                .ok_or(StoreError::JobNotFound(new.job_id))?;
            tables
                .applications
                .get(&key)
                .cloned()
                .map(|application| (application, job))
        };
        if let Some((application, job)) = existing {
            return Ok(Recorded {
                application,
                job,
                created: false,
            });
        }

        tokio::task::yield_now().await;

        let mut tables = self.tables.lock().unwrap();
        let application = Application {
            id: Uuid::new_v4(),
            applicant_id: new.applicant_id,
            job_id: new.job_id,
            resume_key: new.resume_key,
            applied_at: Utc::now(),
        };
        tables.applications.insert(key, application.clone());
        let job = tables
            .jobs
            .get_mut(&new.job_id)
            .ok_or(StoreError::JobNotFound(new.job_id))?;
        job.total_applications += 1;
        Ok(Recorded {
            application,
            job: job.clone(),
            created: true,
        })
    }
}

pub fn test_config(max_upload_bytes: usize) -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        blob_backend: BlobBackendConfig::Filesystem {
            root: "./unused".into(),
        },
        parser_url: "http://parser.invalid".to_string(),
        parser_api_key: "test".to_string(),
        parser_timeout: Duration::from_secs(15),
        parser_max_attempts: 3,
        max_upload_bytes,
        port: 0,
        rust_log: "debug".to_string(),
    }
}

/// `AppState` wired to in-memory doubles, with handles to inspect them.
pub struct TestApp {
    pub state: AppState,
    pub blobs: Arc<MemoryBlobBackend>,
    pub applications: Arc<MemoryApplicationStore>,
}

impl TestApp {
    pub fn new(max_upload_bytes: usize) -> Self {
        let blobs = Arc::new(MemoryBlobBackend::default());
        let profiles = Arc::new(MemoryProfileStore::default());
        let applications = Arc::new(MemoryApplicationStore::default());
        let parser = Arc::new(FakeParser::echo());

        let ingestion = IngestionCoordinator::new(
            BlobStore::new(blobs.clone(), max_upload_bytes),
            ParsingClient::new(parser, RetryPolicy::default()),
            profiles.clone(),
        );
        let registrar = ApplicationRegistrar::new(applications.clone(), profiles.clone());

        let state = AppState {
            config: test_config(max_upload_bytes),
            ingestion: Arc::new(ingestion),
            registrar: Arc::new(registrar),
            profiles,
        };

        Self {
            state,
            blobs,
            applications,
        }
    }
}
