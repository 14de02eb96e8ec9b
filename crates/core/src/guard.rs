// crates/core/src/guard.rs
//! Tracking surface guard: close gating and the delayed "do not close" warning.
//!
//! The guard owns the job machine for one surface. It arms the warning timer
//! once per asynchronous job, cancels it when the job settles, and turns the
//! confirmation button into either a submission or a close.

use std::sync::{Arc, Weak};
use std::time::Duration;

use bulkadd_types::{CollectionId, JobHandle, JobId, JobStatus, SubmissionRequest};
use tokio::sync::watch;

use crate::api::JobsApi;
use crate::config::TrackerConfig;
use crate::error::{CloseRefused, StartError, TrackError};
use crate::machine::{JobEvents, JobMachine};
use crate::session::{lock_session, SharedSession, TrackingSession};
use crate::view::JobView;

/// Callbacks the UI layer wires into the guard.
pub trait SurfaceListener: Send + Sync + 'static {
    /// A bulk add finished; the target collection's list is stale.
    fn batch_finished(&self, _target: &CollectionId) {}

    /// The surface closed. Carries the target collection of the session
    /// that was open, if a submission had been made.
    fn closed(&self, _target: Option<&CollectionId>) {}
}

/// Listener for surfaces that need neither callback.
pub struct NoopListener;

impl SurfaceListener for NoopListener {}

/// What the confirmation button did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmed {
    Submitted(JobHandle),
    Closed(Option<CollectionId>),
}

struct WarningPolicy {
    delay: Duration,
    listener: Arc<dyn SurfaceListener>,
}

impl JobEvents for WarningPolicy {
    fn job_started(&self, shared: &SharedSession, session: &mut TrackingSession, job_id: JobId) {
        if session.warning_armed() {
            return;
        }
        let generation = session.generation();
        let weak: Weak<_> = Arc::downgrade(shared);
        let delay = self.delay;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(shared) = weak.upgrade() else {
                return;
            };
            if lock_session(&shared).show_warning(generation) {
                tracing::debug!(job_id, "Close warning shown");
            }
        });
        session.arm_warning(timer);
    }

    fn job_settled(&self, session: &mut TrackingSession) {
        session.disarm_warning();
    }

    fn batch_finished(&self, target: &CollectionId) {
        self.listener.batch_finished(target);
    }
}

/// One tracking surface: a job machine plus the close gate and the delayed
/// "do not close" warning.
pub struct TrackingGuard {
    machine: JobMachine,
    listener: Arc<dyn SurfaceListener>,
}

impl TrackingGuard {
    pub fn new(api: Arc<dyn JobsApi>, config: &TrackerConfig, listener: Arc<dyn SurfaceListener>) -> Self {
        let policy = WarningPolicy {
            delay: config.warning_delay,
            listener: Arc::clone(&listener),
        };
        Self {
            machine: JobMachine::new(api, config, Arc::new(policy)),
            listener,
        }
    }

    pub fn machine(&self) -> &JobMachine {
        &self.machine
    }

    pub fn view(&self) -> JobView {
        self.machine.view()
    }

    pub fn subscribe(&self) -> watch::Receiver<JobView> {
        self.machine.subscribe()
    }

    pub fn can_close(&self) -> bool {
        self.machine.phase().can_close()
    }

    /// Close the surface and reset the session. Refused while a job is
    /// active; nothing changes in that case.
    pub fn close(&self) -> Result<(), CloseRefused> {
        let target = self.machine.reset_if_closable().inspect_err(|_| {
            tracing::debug!("Close refused while job is active");
        })?;
        self.listener.closed(target.as_ref());
        Ok(())
    }

    /// The confirmation button. Closes a finished session, otherwise submits.
    pub async fn confirm(&self, request: SubmissionRequest) -> Result<Confirmed, StartError> {
        if self.machine.phase().is_finished() {
            let target = self
                .machine
                .reset_if_closable()
                .map_err(|_| StartError::AlreadyActive)?;
            self.listener.closed(target.as_ref());
            return Ok(Confirmed::Closed(target));
        }
        let handle = self.machine.start(request).await?;
        Ok(Confirmed::Submitted(handle))
    }

    pub async fn cancel_job(&self) -> Result<JobStatus, TrackError> {
        self.machine.cancel_job().await
    }

    pub fn resume(&self) -> Result<JobId, TrackError> {
        self.machine.resume()
    }
}
