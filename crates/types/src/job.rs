// crates/types/src/job.rs
//! Job identifiers, status snapshots and the client-side job handle.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-assigned identifier of a bulk-add job.
pub type JobId = u64;

/// State of a server-side job as reported by a status poll.
///
/// `Queued` is the client's initial value before the first poll answers.
/// Values the client does not recognise are kept verbatim in `Unknown`
/// instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobState {
    Queued,
    InProgress,
    Completed,
    Canceled,
    Failed,
    Unknown(String),
}

impl JobState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
            Self::Failed => "failed",
            Self::Unknown(raw) => raw,
        }
    }

    /// `queued` and `in_progress` are the only active states.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::InProgress)
    }

    /// Anything that is not active is terminal, unknown values included.
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

impl From<&str> for JobState {
    fn from(raw: &str) -> Self {
        match raw {
            "queued" => Self::Queued,
            "in_progress" => Self::InProgress,
            "completed" => Self::Completed,
            // The server spells it with two l's.
            "canceled" | "cancelled" => Self::Canceled,
            "failed" => Self::Failed,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl From<String> for JobState {
    fn from(raw: String) -> Self {
        match Self::from(raw.as_str()) {
            Self::Unknown(_) => Self::Unknown(raw),
            known => known,
        }
    }
}

impl From<JobState> for String {
    fn from(state: JobState) -> Self {
        match state {
            JobState::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One snapshot of a job's progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub state: JobState,
    pub processed: u64,
    pub total: u64,
}

impl JobStatus {
    pub fn new(state: JobState, processed: u64, total: u64) -> Self {
        Self {
            state,
            processed,
            total,
        }
    }

    /// Status assumed between submission and the first poll response.
    pub fn queued() -> Self {
        Self::new(JobState::Queued, 0, 0)
    }

    /// Percentage of items processed, in `[0, 100]`.
    ///
    /// Zero while `total` is unknown (0). Clamped so a server reporting
    /// `processed > total` cannot push it past 100.
    pub fn progress_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.processed as f64 / self.total as f64 * 100.0).clamp(0.0, 100.0)
    }
}

impl Default for JobStatus {
    fn default() -> Self {
        Self::queued()
    }
}

/// What the server said when a bulk add was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing needed doing asynchronously; the add is already complete.
    Synchronous,
    /// A background job was created and must be polled.
    Queued(JobId),
}

impl SubmitOutcome {
    /// Wire responses carry `null` for the synchronous case.
    pub fn from_job_id(job_id: Option<JobId>) -> Self {
        match job_id {
            Some(id) => Self::Queued(id),
            None => Self::Synchronous,
        }
    }
}

/// Client-side view of "which job, if any" a tracking session refers to.
///
/// Keeps "nothing submitted yet", "finished synchronously" and "running
/// asynchronously" as three distinct values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobHandle {
    #[default]
    NotStarted,
    SyncDone,
    Running(JobId),
}

impl JobHandle {
    pub fn job_id(&self) -> Option<JobId> {
        match self {
            Self::Running(id) => Some(*id),
            _ => None,
        }
    }

    /// True only when a real server-side job exists.
    pub fn is_async(&self) -> bool {
        matches!(self, Self::Running(_))
    }
}

impl From<SubmitOutcome> for JobHandle {
    fn from(outcome: SubmitOutcome) -> Self {
        match outcome {
            SubmitOutcome::Synchronous => Self::SyncDone,
            SubmitOutcome::Queued(id) => Self::Running(id),
        }
    }
}
