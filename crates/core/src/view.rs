// crates/core/src/view.rs
//! Pure projection from session state to what a UI displays.

use bulkadd_types::{JobState, JobStatus};
use serde::Serialize;

use crate::session::JobPhase;

pub const SYNC_DONE_LABEL: &str = "Finished!";
pub const COMPLETED_LABEL: &str = "Complete!";
pub const CANCELED_LABEL: &str = "Canceled";
pub const FAILED_LABEL: &str = "Failed to add companies.";
pub const SUBMIT_FAILED_MESSAGE: &str = "Something went wrong :(";
pub const CLOSE_WARNING: &str =
    "Please do not close this modal or window until the process is complete.";

/// Everything a tracking surface renders, recomputed after each transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub state_label: String,
    /// Always within `[0, 100]`.
    pub progress_percent: f64,
    pub is_active: bool,
    pub can_close: bool,
    pub warning_visible: bool,
    /// A submission is in flight.
    pub loading: bool,
    /// Polling failed; the job may still be running server-side.
    pub lost_track: bool,
    /// User-facing submission error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for JobView {
    fn default() -> Self {
        project(&JobPhase::NotStarted, false)
    }
}

/// Label for a polled status. Unknown states render as an empty label.
pub fn status_label(status: &JobStatus) -> String {
    match &status.state {
        JobState::Queued => String::new(),
        JobState::InProgress => format!("Adding {} of {}...", status.processed, status.total),
        JobState::Completed => COMPLETED_LABEL.to_string(),
        JobState::Canceled => CANCELED_LABEL.to_string(),
        JobState::Failed => FAILED_LABEL.to_string(),
        JobState::Unknown(_) => String::new(),
    }
}

pub fn project(phase: &JobPhase, warning_visible: bool) -> JobView {
    let (state_label, progress_percent, error) = match phase {
        JobPhase::NotStarted | JobPhase::Submitting => (String::new(), 0.0, None),
        JobPhase::SubmitFailed { .. } => (String::new(), 0.0, Some(SUBMIT_FAILED_MESSAGE.to_string())),
        JobPhase::SyncDone => (SYNC_DONE_LABEL.to_string(), 100.0, None),
        JobPhase::Active { status, .. } | JobPhase::Settled { status, .. } => {
            (status_label(status), status.progress_percent(), None)
        }
        JobPhase::LostTrack { job_id, last, .. } => (
            format!("Lost track of job {job_id}. It may still be running."),
            last.progress_percent(),
            None,
        ),
    };

    JobView {
        state_label,
        progress_percent,
        is_active: phase.is_active(),
        can_close: phase.can_close(),
        warning_visible,
        loading: matches!(phase, JobPhase::Submitting),
        lost_track: matches!(phase, JobPhase::LostTrack { .. }),
        error,
    }
}
