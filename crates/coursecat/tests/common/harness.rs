//! Test harness for isolated pipeline runs.
//!
//! `TestHarness` wires a `Pipeline` to:
//! - an in-memory SQLite store wrapped in `RecordingStore`, which records
//!   commit sizes and can be told to fail commits
//! - a `ScriptedService` answering from a closure and recording each call

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use coursecat::categorizer::{CategorizeError, Categorization, CategoryService};
use coursecat::course::{ContentPayload, CourseRecord};
use coursecat::pipeline::{Pipeline, PipelineConfig, ProgressReporter, ProgressSnapshot};
use coursecat::store::{CourseStore, SqliteCourseStore, StoreError, WriteBatch};

/// Store wrapper that records every commit.
pub struct RecordingStore {
    pub inner: SqliteCourseStore,
    commits: Mutex<Vec<usize>>,
    fail_commits: AtomicBool,
}

impl RecordingStore {
    pub fn new(inner: SqliteCourseStore) -> Self {
        Self {
            inner,
            commits: Mutex::new(Vec::new()),
            fail_commits: AtomicBool::new(false),
        }
    }

    /// Sizes of the successful commits, in order.
    pub fn commit_sizes(&self) -> Vec<usize> {
        self.commits.lock().unwrap().clone()
    }

    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CourseStore for RecordingStore {
    async fn fetch_page(
        &self,
        after: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<CourseRecord>, StoreError> {
        self.inner.fetch_page(after, limit).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("commit rejected".to_string()));
        }
        let size = batch.len();
        self.inner.commit(batch).await?;
        self.commits.lock().unwrap().push(size);
        Ok(())
    }

    async fn try_acquire_lock(
        &self,
        name: &str,
        owner: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        self.inner.try_acquire_lock(name, owner, ttl).await
    }

    async fn renew_lock(
        &self,
        name: &str,
        owner: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        self.inner.renew_lock(name, owner, ttl).await
    }

    async fn release_lock(&self, name: &str, owner: &str) -> Result<(), StoreError> {
        self.inner.release_lock(name, owner).await
    }
}

type Responder = dyn Fn(&ContentPayload) -> Result<Categorization, CategorizeError> + Send + Sync;

/// A recorded call to the scripted service.
#[derive(Debug, Clone)]
pub struct ServiceCall {
    pub title: String,
    pub at: Instant,
}

/// Categorization service answering from a closure.
pub struct ScriptedService {
    responder: Box<Responder>,
    calls: Mutex<Vec<ServiceCall>>,
}

impl ScriptedService {
    pub fn new(
        responder: impl Fn(&ContentPayload) -> Result<Categorization, CategorizeError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always suggests `category` with high confidence.
    pub fn always(category: &str) -> Self {
        let category = category.to_string();
        Self::new(move |_| Ok(categorization(&category, "high")))
    }

    /// Always fails with `error`.
    pub fn failing(error: CategorizeError) -> Self {
        Self::new(move |_| Err(error.clone()))
    }

    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn called_titles(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.title).collect()
    }
}

#[async_trait]
impl CategoryService for ScriptedService {
    async fn categorize(
        &self,
        payload: &ContentPayload,
    ) -> Result<Categorization, CategorizeError> {
        self.calls.lock().unwrap().push(ServiceCall {
            title: payload.title.clone(),
            at: Instant::now(),
        });
        (self.responder)(payload)
    }
}

pub fn categorization(category: &str, confidence: &str) -> Categorization {
    Categorization {
        category: category.to_string(),
        confidence: confidence.to_string(),
    }
}

/// Progress reporter that keeps every snapshot.
#[derive(Default)]
pub struct SnapshotRecorder {
    snapshots: Mutex<Vec<ProgressSnapshot>>,
}

impl SnapshotRecorder {
    pub fn snapshots(&self) -> Vec<ProgressSnapshot> {
        self.snapshots.lock().unwrap().clone()
    }

    pub fn processed_counts(&self) -> Vec<usize> {
        self.snapshots().iter().map(|s| s.processed).collect()
    }
}

impl ProgressReporter for SnapshotRecorder {
    fn report(&self, snapshot: ProgressSnapshot) {
        self.snapshots.lock().unwrap().push(snapshot);
    }
}

/// Test harness providing an isolated pipeline.
pub struct TestHarness {
    pub store: Arc<RecordingStore>,
    pub service: Arc<ScriptedService>,
    pub pipeline: Pipeline,
    pub started: Instant,
}

impl TestHarness {
    /// Seeds an in-memory store with `records` and uses the default config.
    pub fn new(records: &[CourseRecord], service: ScriptedService) -> Self {
        Self::with_config(records, service, PipelineConfig::default())
    }

    pub fn with_config(
        records: &[CourseRecord],
        service: ScriptedService,
        config: PipelineConfig,
    ) -> Self {
        let inner = SqliteCourseStore::open_in_memory().expect("Failed to open test store");
        for record in records {
            inner.upsert(record).expect("Failed to seed record");
        }

        let store = Arc::new(RecordingStore::new(inner));
        let service = Arc::new(service);
        let pipeline = Pipeline::new(store.clone(), service.clone(), Arc::new(config));

        Self {
            store,
            service,
            pipeline,
            started: Instant::now(),
        }
    }

    pub fn find(&self, id: &str) -> CourseRecord {
        self.store
            .inner
            .find(id)
            .expect("Failed to read record")
            .unwrap_or_else(|| panic!("record '{}' not found", id))
    }

    /// Milliseconds from harness creation to each service call.
    pub fn call_offsets_ms(&self) -> Vec<u128> {
        self.service
            .calls()
            .iter()
            .map(|c| c.at.duration_since(self.started).as_millis())
            .collect()
    }
}
