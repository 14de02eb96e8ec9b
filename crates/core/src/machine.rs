// crates/core/src/machine.rs
//! Job state machine for one bulk-add job per session.
//!
//! `NotStarted → Submitting → (SyncDone | Active)`, and `Active` moves to
//! `Settled` on a terminal poll result or to `LostTrack` when polling fails.
//! All transitions go through [`TrackingSession`] under its lock; async
//! results carry the session generation they were started under and are
//! dropped if the session has been reset since.

use std::sync::{Arc, MutexGuard};

use bulkadd_types::{CollectionId, JobHandle, JobId, JobStatus, SubmissionRequest, SubmitOutcome};
use tokio::sync::watch;

use crate::api::JobsApi;
use crate::config::TrackerConfig;
use crate::error::{ApiError, CloseRefused, MutationError, PollError, StartError, TrackError};
use crate::mutation::{MutationState, SubmissionController};
use crate::poller::{PollHandle, PollObserver, Poller};
use crate::session::{lock_session, JobPhase, SharedSession, StatusApplied, TrackingSession};
use crate::view::JobView;

/// Hooks the machine calls as a job moves through its lifecycle.
pub trait JobEvents: Send + Sync + 'static {
    /// A real asynchronous job now exists. Runs under the session lock.
    fn job_started(&self, _shared: &SharedSession, _session: &mut TrackingSession, _job_id: JobId) {}

    /// The job reached a terminal state. Runs under the session lock, before
    /// the poller is torn down.
    fn job_settled(&self, _session: &mut TrackingSession) {}

    /// The add finished (synchronously or as a terminal job) and the target
    /// collection should be refreshed. Runs without the session lock.
    fn batch_finished(&self, _target: &CollectionId) {}
}

/// Ignores every event.
pub struct NoEvents;

impl JobEvents for NoEvents {}

/// Drives one tracking session: submission, polling, cancel, resume and reset.
///
/// Dropping the machine resets the session, which stops its poller.
pub struct JobMachine {
    session: SharedSession,
    api: Arc<dyn JobsApi>,
    controller: SubmissionController,
    poller: Poller,
    events: Arc<dyn JobEvents>,
}

impl JobMachine {
    pub fn new(api: Arc<dyn JobsApi>, config: &TrackerConfig, events: Arc<dyn JobEvents>) -> Self {
        Self {
            session: TrackingSession::shared(),
            controller: SubmissionController::new(Arc::clone(&api)),
            api,
            poller: Poller::new(config.poll_interval).with_fetch_timeout(config.fetch_timeout),
            events,
        }
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn view(&self) -> JobView {
        lock_session(&self.session).view()
    }

    pub fn subscribe(&self) -> watch::Receiver<JobView> {
        lock_session(&self.session).subscribe()
    }

    pub fn phase(&self) -> JobPhase {
        lock_session(&self.session).phase().clone()
    }

    pub fn handle(&self) -> JobHandle {
        lock_session(&self.session).phase().handle()
    }

    pub fn submission(&self) -> MutationState<SubmitOutcome> {
        self.controller.state()
    }

    /// Submit a bulk add and, if the server created a job, start polling it.
    ///
    /// Rejected while a submission or job is already in progress, and once
    /// the session has finished a job (close it first).
    pub async fn start(&self, request: SubmissionRequest) -> Result<JobHandle, StartError> {
        let generation = lock_session(&self.session).begin_submit(request.target().clone())?;
        let mut pending = PendingSubmit {
            session: &self.session,
            generation,
            armed: true,
        };
        let result = self.controller.submit(&request).await;
        pending.armed = false;

        let mut session = lock_session(&self.session);
        if session.generation() != generation {
            if let Ok(SubmitOutcome::Queued(job_id)) = &result {
                tracing::warn!(job_id, "Session reset during submission; job will not be tracked");
            }
            return Err(StartError::Superseded);
        }

        match result {
            Ok(outcome) => {
                let handle = session.submit_succeeded(outcome);
                match handle {
                    JobHandle::Running(job_id) => {
                        tracing::info!(job_id, target_collection = ?session.target(), "Tracking bulk add job");
                        self.events.job_started(&self.session, &mut session, job_id);
                        let poller = self.spawn_poller(generation, job_id);
                        session.attach_poller(poller);
                    }
                    _ => {
                        tracing::info!("Bulk add finished synchronously");
                        notify_finished(session, self.events.as_ref());
                    }
                }
                Ok(handle)
            }
            Err(MutationError::InFlight) => {
                session.submit_failed(MutationError::InFlight.to_string());
                Err(StartError::AlreadyActive)
            }
            Err(MutationError::Api(e)) => {
                session.submit_failed(e.to_string());
                Err(StartError::Submit(e))
            }
        }
    }

    /// Restart polling after tracking was lost.
    pub fn resume(&self) -> Result<JobId, TrackError> {
        let mut session = lock_session(&self.session);
        let generation = session.generation();
        let job_id = session.resume().ok_or(TrackError::NotLost)?;
        tracing::info!(job_id, "Resuming job tracking");
        let poller = self.spawn_poller(generation, job_id);
        session.attach_poller(poller);
        Ok(job_id)
    }

    /// Ask the server to cancel the tracked job and apply the status it
    /// returns as if it had been polled.
    pub async fn cancel_job(&self) -> Result<JobStatus, TrackError> {
        let (generation, job_id) = {
            let session = lock_session(&self.session);
            match session.phase() {
                JobPhase::Active { job_id, .. } | JobPhase::LostTrack { job_id, .. } => {
                    (session.generation(), *job_id)
                }
                _ => return Err(TrackError::NoJob),
            }
        };

        tracing::info!(job_id, "Cancelling bulk add job");
        let status = self.api.cancel_job(job_id).await?;

        let mut session = lock_session(&self.session);
        if session.generation() != generation {
            return Ok(status);
        }
        match session.apply_status(status.clone()) {
            StatusApplied::Settled => {
                self.events.job_settled(&mut session);
                let poller = session.take_poller();
                notify_finished(session, self.events.as_ref());
                drop(poller);
            }
            StatusApplied::Progress if !session.has_poller() => {
                let poller = self.spawn_poller(generation, job_id);
                session.attach_poller(poller);
            }
            StatusApplied::Progress | StatusApplied::Ignored => {}
        }
        Ok(status)
    }

    /// Reset to `NotStarted` unconditionally, stopping the poller and the
    /// warning timer.
    pub fn reset(&self) {
        let detached = lock_session(&self.session).reset();
        detached.release();
    }

    /// Reset only if the session may close. Returns the target collection of
    /// the session that was closed.
    pub fn reset_if_closable(&self) -> Result<Option<CollectionId>, CloseRefused> {
        let mut session = lock_session(&self.session);
        if !session.phase().can_close() {
            return Err(CloseRefused);
        }
        let target = session.target().cloned();
        let detached = session.reset();
        drop(session);
        detached.release();
        Ok(target)
    }

    fn spawn_poller(&self, generation: u64, job_id: JobId) -> PollHandle {
        let api = Arc::clone(&self.api);
        let observer = JobObserver {
            session: Arc::clone(&self.session),
            events: Arc::clone(&self.events),
            generation,
            job_id,
        };
        self.poller.spawn(
            move || {
                let api = Arc::clone(&api);
                async move { api.get_job_status(job_id).await }
            },
            observer,
        )
    }
}

impl Drop for JobMachine {
    fn drop(&mut self) {
        self.reset();
    }
}

/// Rolls a session back out of `Submitting` if `start` is dropped before the
/// submission resolves.
struct PendingSubmit<'a> {
    session: &'a SharedSession,
    generation: u64,
    armed: bool,
}

impl Drop for PendingSubmit<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut session = lock_session(self.session);
        if session.generation() == self.generation && session.abandon_submit() {
            tracing::warn!("Submission abandoned before it resolved; session rolled back");
        }
    }
}

/// Releases the lock, then tells listeners the target changed.
fn notify_finished(session: MutexGuard<'_, TrackingSession>, events: &dyn JobEvents) {
    let target = session.target().cloned();
    drop(session);
    if let Some(target) = target {
        events.batch_finished(&target);
    }
}

/// Applies poll results for one job in one session generation.
struct JobObserver {
    session: SharedSession,
    events: Arc<dyn JobEvents>,
    generation: u64,
    job_id: JobId,
}

impl JobObserver {
    fn current(&self) -> Option<MutexGuard<'_, TrackingSession>> {
        let session = lock_session(&self.session);
        if session.generation() == self.generation {
            Some(session)
        } else {
            tracing::warn!(job_id = self.job_id, "Discarding poll result for a reset session");
            None
        }
    }
}

impl PollObserver<JobStatus, ApiError> for JobObserver {
    fn on_data(&mut self, status: &JobStatus) {
        let Some(mut session) = self.current() else {
            return;
        };
        tracing::debug!(
            job_id = self.job_id,
            state = %status.state,
            processed = status.processed,
            total = status.total,
            "Job status polled"
        );
        if session.apply_status(status.clone()) == StatusApplied::Settled {
            tracing::info!(job_id = self.job_id, state = %status.state, "Bulk add job settled");
            self.events.job_settled(&mut session);
            notify_finished(session, self.events.as_ref());
        }
    }

    fn is_complete(&self, status: &JobStatus) -> bool {
        status.state.is_terminal()
    }

    fn on_completed(&mut self) {
        if let Some(mut session) = self.current() {
            // Our own task is exiting.
            drop(session.take_poller());
        }
    }

    fn on_error(&mut self, error: PollError<ApiError>) {
        let Some(mut session) = self.current() else {
            return;
        };
        tracing::warn!(job_id = self.job_id, error = %error, "Lost track of bulk add job");
        if session.lose_track(error.to_string()) {
            drop(session.take_poller());
        }
    }
}
