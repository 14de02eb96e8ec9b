// crates/core/tests/common/mod.rs
//! Scripted `JobsApi` and listener shared by the integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bulkadd_core::types::{
    Collection, CollectionId, CollectionPage, JobId, JobState, JobStatus, SubmissionRequest, SubmitOutcome,
};
use bulkadd_core::{ApiError, JobsApi, SurfaceListener};

pub fn status(state: JobState, processed: u64, total: u64) -> Result<JobStatus, ApiError> {
    Ok(JobStatus::new(state, processed, total))
}

pub fn network_error() -> Result<JobStatus, ApiError> {
    Err(ApiError::Network("connection refused".into()))
}

/// Answers from per-call scripts. The last scripted status for a job
/// repeats forever.
#[derive(Default)]
pub struct ScriptedApi {
    submits: Mutex<VecDeque<Result<SubmitOutcome, ApiError>>>,
    statuses: Mutex<HashMap<JobId, VecDeque<Result<JobStatus, ApiError>>>>,
    latency: Mutex<HashMap<JobId, Duration>>,
    submit_latency: Mutex<Option<Duration>>,
    cancels: Mutex<VecDeque<Result<JobStatus, ApiError>>>,
    fetches: Mutex<HashMap<JobId, usize>>,
    submit_calls: AtomicUsize,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(self, outcome: Result<SubmitOutcome, ApiError>) -> Self {
        self.submits.lock().unwrap().push_back(outcome);
        self
    }

    pub fn statuses(self, job_id: JobId, script: Vec<Result<JobStatus, ApiError>>) -> Self {
        self.statuses.lock().unwrap().insert(job_id, script.into());
        self
    }

    pub fn latency(self, job_id: JobId, latency: Duration) -> Self {
        self.latency.lock().unwrap().insert(job_id, latency);
        self
    }

    /// Every submission takes this long to answer.
    pub fn submit_latency(self, latency: Duration) -> Self {
        *self.submit_latency.lock().unwrap() = Some(latency);
        self
    }

    pub fn cancel(self, outcome: Result<JobStatus, ApiError>) -> Self {
        self.cancels.lock().unwrap().push_back(outcome);
        self
    }

    pub fn fetches(&self, job_id: JobId) -> usize {
        self.fetches.lock().unwrap().get(&job_id).copied().unwrap_or(0)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobsApi for ScriptedApi {
    async fn submit_bulk_add(&self, _request: &SubmissionRequest) -> Result<SubmitOutcome, ApiError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        let latency = *self.submit_latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.submits
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ApiError::Status {
                status: 500,
                detail: "no scripted submission".into(),
            }))
    }

    async fn get_job_status(&self, job_id: JobId) -> Result<JobStatus, ApiError> {
        *self.fetches.lock().unwrap().entry(job_id).or_default() += 1;
        let next = {
            let mut statuses = self.statuses.lock().unwrap();
            match statuses.get_mut(&job_id) {
                Some(script) if script.len() > 1 => script.pop_front().unwrap(),
                Some(script) => script.front().cloned().unwrap(),
                None => Err(ApiError::NotFound(format!("Job {job_id} not found"))),
            }
        };
        let latency = self.latency.lock().unwrap().get(&job_id).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        next
    }

    async fn cancel_job(&self, _job_id: JobId) -> Result<JobStatus, ApiError> {
        self.cancels
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ApiError::Rejected("Job is not in progress".into())))
    }

    async fn list_collections(&self) -> Result<Vec<Collection>, ApiError> {
        Ok(Vec::new())
    }

    async fn list_collection_items(
        &self,
        collection_id: &CollectionId,
        _offset: u64,
        _limit: u64,
    ) -> Result<CollectionPage, ApiError> {
        Err(ApiError::NotFound(collection_id.to_string()))
    }
}

/// Records the UI callbacks.
#[derive(Default)]
pub struct RecordingListener {
    pub finished: Mutex<Vec<CollectionId>>,
    pub closed: Mutex<Vec<Option<CollectionId>>>,
}

impl RecordingListener {
    pub fn finished_targets(&self) -> Vec<CollectionId> {
        self.finished.lock().unwrap().clone()
    }

    pub fn closed_targets(&self) -> Vec<Option<CollectionId>> {
        self.closed.lock().unwrap().clone()
    }
}

impl SurfaceListener for RecordingListener {
    fn batch_finished(&self, target: &CollectionId) {
        self.finished.lock().unwrap().push(target.clone());
    }

    fn closed(&self, target: Option<&CollectionId>) {
        self.closed.lock().unwrap().push(target.cloned());
    }
}
