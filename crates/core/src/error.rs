// crates/core/src/error.rs
use std::time::Duration;

use thiserror::Error;

/// Errors reported by a [`crate::JobsApi`] implementation.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl ApiError {
    /// Classify a non-success HTTP status into the closest variant.
    pub fn from_status(status: u16, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match status {
            404 => Self::NotFound(detail),
            400 | 409 | 422 => Self::Rejected(detail),
            _ => Self::Status { status, detail },
        }
    }
}

/// Why a poller stopped without completing.
#[derive(Debug, Error)]
pub enum PollError<E> {
    #[error("Status fetch failed: {0}")]
    Fetch(E),

    #[error("Status fetch timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors from a single-flight [`crate::Mutation`].
#[derive(Debug, Clone, Error)]
pub enum MutationError {
    #[error("A submission is already in flight")]
    InFlight,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Reasons [`crate::JobMachine::start`] refuses or fails.
#[derive(Debug, Clone, Error)]
pub enum StartError {
    #[error("A job is already being submitted or tracked in this session")]
    AlreadyActive,

    #[error("This session already finished a job; close it before starting another")]
    SessionSpent,

    #[error("The session was reset while the submission was in flight")]
    Superseded,

    #[error("Submission failed: {0}")]
    Submit(#[source] ApiError),
}

/// Errors from cancelling or resuming the tracked job.
#[derive(Debug, Clone, Error)]
pub enum TrackError {
    #[error("No job is being tracked")]
    NoJob,

    #[error("Tracking is not lost; nothing to resume")]
    NotLost,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Returned when the tracking surface refuses to close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("The tracking surface cannot close while a job is active")]
pub struct CloseRefused;
