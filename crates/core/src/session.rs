// crates/core/src/session.rs
//! State of one tracking session and its transitions.
//!
//! A `TrackingSession` lives behind a mutex shared by the job machine, its
//! poller observer and the warning timer. Every transition is a plain `&mut`
//! method with no suspension point, so an interleaved callback sees either
//! the state before a transition or the state after it. Each transition
//! republishes the derived [`JobView`].

use std::sync::{Arc, Mutex, MutexGuard};

use bulkadd_types::{CollectionId, JobHandle, JobId, JobStatus, SubmitOutcome};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::StartError;
use crate::poller::PollHandle;
use crate::view::{self, JobView};

pub type SharedSession = Arc<Mutex<TrackingSession>>;

/// Where a session is in the job lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum JobPhase {
    NotStarted,
    Submitting,
    /// The create-job call failed; `start` may be retried.
    SubmitFailed { error: String },
    /// The server finished the add without creating a job.
    SyncDone,
    Active { job_id: JobId, status: JobStatus },
    /// A poll reported a terminal state.
    Settled { job_id: JobId, status: JobStatus },
    /// Polling failed. The job may still be running server-side.
    LostTrack {
        job_id: JobId,
        last: JobStatus,
        error: String,
    },
}

impl JobPhase {
    pub fn handle(&self) -> JobHandle {
        match self {
            Self::NotStarted | Self::Submitting | Self::SubmitFailed { .. } => JobHandle::NotStarted,
            Self::SyncDone => JobHandle::SyncDone,
            Self::Active { job_id, .. } | Self::Settled { job_id, .. } | Self::LostTrack { job_id, .. } => {
                JobHandle::Running(*job_id)
            }
        }
    }

    pub fn status(&self) -> Option<&JobStatus> {
        match self {
            Self::Active { status, .. } | Self::Settled { status, .. } => Some(status),
            Self::LostTrack { last, .. } => Some(last),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    /// Synchronous completion or a terminal job state.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::SyncDone | Self::Settled { .. })
    }

    pub fn can_close(&self) -> bool {
        match self {
            Self::NotStarted | Self::SubmitFailed { .. } | Self::SyncDone | Self::Settled { .. } => true,
            Self::Submitting | Self::Active { .. } => false,
            // Governed by the last status we saw.
            Self::LostTrack { last, .. } => last.state.is_terminal(),
        }
    }
}

/// Result of feeding a polled status into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusApplied {
    Progress,
    Settled,
    /// The session was not tracking an active job; nothing changed.
    Ignored,
}

/// Resources detached from a session by `reset`, released outside the lock.
#[must_use]
pub(crate) struct Detached {
    poller: Option<PollHandle>,
    warning_timer: Option<JoinHandle<()>>,
}

impl Detached {
    pub(crate) fn release(self) {
        if let Some(poller) = self.poller {
            poller.stop();
        }
        if let Some(timer) = self.warning_timer {
            timer.abort();
        }
    }
}

/// Mutable state of one tracking surface: the job phase, its target, the
/// warning flag, and the poller and timer bound to the current generation.
pub struct TrackingSession {
    generation: u64,
    phase: JobPhase,
    target: Option<CollectionId>,
    warning_visible: bool,
    warning_timer: Option<JoinHandle<()>>,
    poller: Option<PollHandle>,
    views: watch::Sender<JobView>,
}

impl TrackingSession {
    /// Create an idle session at generation 0.
    pub fn new() -> Self {
        let (views, _) = watch::channel(JobView::default());
        Self {
            generation: 0,
            phase: JobPhase::NotStarted,
            target: None,
            warning_visible: false,
            warning_timer: None,
            poller: None,
            views,
        }
    }

    pub fn shared() -> SharedSession {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Bumped on every reset. Async work captures it and drops its result
    /// if it no longer matches.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn phase(&self) -> &JobPhase {
        &self.phase
    }

    pub fn target(&self) -> Option<&CollectionId> {
        self.target.as_ref()
    }

    pub fn warning_visible(&self) -> bool {
        self.warning_visible
    }

    pub fn warning_armed(&self) -> bool {
        self.warning_timer.is_some()
    }

    pub fn has_poller(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| !p.is_stopped())
    }

    pub fn view(&self) -> JobView {
        view::project(&self.phase, self.warning_visible)
    }

    pub fn subscribe(&self) -> watch::Receiver<JobView> {
        self.views.subscribe()
    }

    fn publish(&self) {
        self.views.send_replace(self.view());
    }

    pub(crate) fn begin_submit(&mut self, target: CollectionId) -> Result<u64, StartError> {
        match self.phase {
            JobPhase::NotStarted | JobPhase::SubmitFailed { .. } => {}
            JobPhase::Submitting | JobPhase::Active { .. } => return Err(StartError::AlreadyActive),
            JobPhase::SyncDone | JobPhase::Settled { .. } | JobPhase::LostTrack { .. } => {
                return Err(StartError::SessionSpent)
            }
        }
        self.phase = JobPhase::Submitting;
        self.target = Some(target);
        self.publish();
        Ok(self.generation)
    }

    pub(crate) fn submit_succeeded(&mut self, outcome: SubmitOutcome) -> JobHandle {
        self.phase = match outcome {
            SubmitOutcome::Synchronous => JobPhase::SyncDone,
            SubmitOutcome::Queued(job_id) => JobPhase::Active {
                job_id,
                status: JobStatus::queued(),
            },
        };
        self.publish();
        self.phase.handle()
    }

    /// Submitting → NotStarted, for a submission whose caller went away
    /// before it resolved. Returns false if the session was not submitting.
    pub(crate) fn abandon_submit(&mut self) -> bool {
        if self.phase != JobPhase::Submitting {
            return false;
        }
        self.phase = JobPhase::NotStarted;
        self.target = None;
        self.publish();
        true
    }

    pub(crate) fn submit_failed(&mut self, error: String) {
        self.phase = JobPhase::SubmitFailed { error };
        self.publish();
    }

    /// Feed a status for the tracked job. Accepted while active, and while
    /// tracking is lost (a cancel response can settle a lost job).
    pub(crate) fn apply_status(&mut self, status: JobStatus) -> StatusApplied {
        let job_id = match self.phase {
            JobPhase::Active { job_id, .. } | JobPhase::LostTrack { job_id, .. } => job_id,
            _ => return StatusApplied::Ignored,
        };
        let applied = if status.state.is_terminal() {
            self.phase = JobPhase::Settled { job_id, status };
            StatusApplied::Settled
        } else {
            self.phase = JobPhase::Active { job_id, status };
            StatusApplied::Progress
        };
        self.publish();
        applied
    }

    /// Active → LostTrack. Returns false if the session was not active.
    pub(crate) fn lose_track(&mut self, error: String) -> bool {
        let JobPhase::Active { job_id, status } = &self.phase else {
            return false;
        };
        self.phase = JobPhase::LostTrack {
            job_id: *job_id,
            last: status.clone(),
            error,
        };
        self.publish();
        true
    }

    /// LostTrack → Active with the last known status.
    pub(crate) fn resume(&mut self) -> Option<JobId> {
        let JobPhase::LostTrack { job_id, last, .. } = &self.phase else {
            return None;
        };
        let job_id = *job_id;
        self.phase = JobPhase::Active {
            job_id,
            status: last.clone(),
        };
        self.publish();
        Some(job_id)
    }

    pub(crate) fn attach_poller(&mut self, poller: PollHandle) {
        if let Some(previous) = self.poller.replace(poller) {
            previous.stop();
        }
    }

    pub(crate) fn take_poller(&mut self) -> Option<PollHandle> {
        self.poller.take()
    }

    /// Arms at most one warning timer per job.
    pub(crate) fn arm_warning(&mut self, timer: JoinHandle<()>) {
        match self.warning_timer {
            Some(_) => timer.abort(),
            None => self.warning_timer = Some(timer),
        }
    }

    /// Shows the warning if the job it was armed for is still unfinished.
    pub(crate) fn show_warning(&mut self, generation: u64) -> bool {
        let unfinished = matches!(self.phase, JobPhase::Active { .. } | JobPhase::LostTrack { .. });
        if generation != self.generation || !unfinished {
            return false;
        }
        self.warning_timer = None;
        self.warning_visible = true;
        self.publish();
        true
    }

    pub(crate) fn disarm_warning(&mut self) {
        if let Some(timer) = self.warning_timer.take() {
            timer.abort();
        }
        if self.warning_visible {
            self.warning_visible = false;
            self.publish();
        }
    }

    /// Back to `NotStarted`, invalidating all in-flight async work.
    pub(crate) fn reset(&mut self) -> Detached {
        self.generation += 1;
        self.phase = JobPhase::NotStarted;
        self.target = None;
        self.warning_visible = false;
        let detached = Detached {
            poller: self.poller.take(),
            warning_timer: self.warning_timer.take(),
        };
        self.publish();
        detached
    }
}

impl Default for TrackingSession {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn lock_session(session: &Mutex<TrackingSession>) -> MutexGuard<'_, TrackingSession> {
    session.lock().unwrap_or_else(|poisoned| {
        tracing::error!("Mutex poisoned in tracking session; recovering");
        poisoned.into_inner()
    })
}
