// crates/sim/src/jobs.rs
//! Background bulk-add jobs and the runner that owns them.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, RwLock};

use bulkadd_types::{JobId, JobState, JobStatus};

const IN_PROGRESS: u8 = 0;
const COMPLETED: u8 = 1;
const CANCELED: u8 = 2;
const FAILED: u8 = 3;

/// Lock-free progress of a single job.
///
/// Only `in_progress` may transition, so a cancel that lands while the job
/// is finishing its last insert is never overwritten by `complete`.
pub struct JobRecord {
    id: JobId,
    status: AtomicU8,
    added: AtomicU64,
    total: u64,
}

impl JobRecord {
    pub fn new(id: JobId, total: u64) -> Self {
        Self {
            id,
            status: AtomicU8::new(IN_PROGRESS),
            added: AtomicU64::new(0),
            total,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    /// Record one insert. Returns the new count.
    pub fn increment(&self) -> u64 {
        self.added.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn added(&self) -> u64 {
        self.added.load(Ordering::Relaxed)
    }

    pub fn is_cancelled(&self) -> bool {
        self.status.load(Ordering::Acquire) == CANCELED
    }

    pub fn complete(&self) -> bool {
        self.transition(COMPLETED)
    }

    pub fn fail(&self) -> bool {
        self.transition(FAILED)
    }

    /// Returns false if the job was no longer in progress.
    pub fn cancel(&self) -> bool {
        self.transition(CANCELED)
    }

    fn transition(&self, to: u8) -> bool {
        self.status
            .compare_exchange(IN_PROGRESS, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn snapshot(&self) -> JobStatus {
        let state = match self.status.load(Ordering::Acquire) {
            IN_PROGRESS => JobState::InProgress,
            COMPLETED => JobState::Completed,
            CANCELED => JobState::Canceled,
            _ => JobState::Failed,
        };
        JobStatus::new(state, self.added(), self.total)
    }
}

/// Spawns jobs and keeps their records for status lookups.
pub struct JobRunner {
    next_id: AtomicU64,
    jobs: RwLock<HashMap<JobId, Arc<JobRecord>>>,
}

impl JobRunner {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Start a job on a new tokio task.
    ///
    /// `Ok` completes the job, `Err` fails it. Neither overrides a cancel.
    pub fn start_job<F, Fut>(&self, total: u64, f: F) -> Arc<JobRecord>
    where
        F: FnOnce(Arc<JobRecord>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let record = Arc::new(JobRecord::new(id, total));

        match self.jobs.write() {
            Ok(mut jobs) => {
                jobs.insert(id, Arc::clone(&record));
            }
            Err(e) => tracing::error!("RwLock poisoned writing jobs map: {e}"),
        }

        let task_record = Arc::clone(&record);
        tokio::spawn(async move {
            match f(Arc::clone(&task_record)).await {
                Ok(()) => {
                    if task_record.complete() {
                        tracing::debug!(job_id = id, "Simulated job completed");
                    }
                }
                Err(e) => {
                    if task_record.fail() {
                        tracing::warn!(job_id = id, error = %e, "Simulated job failed");
                    }
                }
            }
        });

        record
    }

    pub fn get(&self, id: JobId) -> Option<Arc<JobRecord>> {
        match self.jobs.read() {
            Ok(jobs) => jobs.get(&id).cloned(),
            Err(e) => {
                tracing::error!("RwLock poisoned reading jobs map: {e}");
                None
            }
        }
    }

    /// Snapshots of every job still in progress, by id.
    pub fn active_jobs(&self) -> Vec<(JobId, JobStatus)> {
        match self.jobs.read() {
            Ok(jobs) => {
                let mut active: Vec<_> = jobs
                    .values()
                    .map(|r| (r.id(), r.snapshot()))
                    .filter(|(_, s)| s.state.is_active())
                    .collect();
                active.sort_by_key(|(id, _)| *id);
                active
            }
            Err(e) => {
                tracing::error!("RwLock poisoned reading jobs map: {e}");
                Vec::new()
            }
        }
    }
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new()
    }
}
