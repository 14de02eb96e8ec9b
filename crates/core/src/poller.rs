// crates/core/src/poller.rs
//! Fixed-interval status poller.
//!
//! A `Poller` repeatedly runs a caller-supplied fetch until an observer
//! declares the fetched value complete, the fetch fails, or the returned
//! [`PollHandle`] is stopped.
//!
//! Fetches are serialized: the next interval only starts once the previous
//! fetch has resolved, so a slow endpoint never sees overlapping requests.
//! The first fetch fires one interval after `spawn`.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::DEFAULT_POLL_INTERVAL;
use crate::error::PollError;

/// Receives everything a poller produces.
///
/// Callbacks run on the poller's task and must not block.
pub trait PollObserver<T, E>: Send + 'static {
    /// Called for every fetched value, before `is_complete`.
    fn on_data(&mut self, value: &T);

    /// Whether polling should end after this value.
    fn is_complete(&self, value: &T) -> bool;

    /// Called once, after the value that satisfied `is_complete`.
    fn on_completed(&mut self);

    /// Called once when a fetch fails or times out. Polling has stopped.
    fn on_error(&mut self, error: PollError<E>);
}

/// Poller configuration. Cheap to copy; `spawn` may be called repeatedly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poller {
    interval: Duration,
    fetch_timeout: Option<Duration>,
}

impl Default for Poller {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl Poller {
    /// A zero interval falls back to the default one-second interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: if interval.is_zero() {
                DEFAULT_POLL_INTERVAL
            } else {
                interval
            },
            fetch_timeout: None,
        }
    }

    /// Bound each fetch. Expiry stops the poller like a failed fetch.
    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start polling on a new tokio task.
    ///
    /// Dropping the returned handle stops the poller.
    pub fn spawn<T, E, F, Fut, O>(&self, fetch: F, observer: O) -> PollHandle
    where
        T: Send + 'static,
        E: Send + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        O: PollObserver<T, E>,
    {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(
            self.interval,
            self.fetch_timeout,
            fetch,
            observer,
            cancel.clone(),
        ));
        PollHandle { cancel, task }
    }
}

async fn run<T, E, F, Fut, O>(
    interval: Duration,
    fetch_timeout: Option<Duration>,
    mut fetch: F,
    mut observer: O,
    cancel: CancellationToken,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    O: PollObserver<T, E>,
{
    let mut tick: u64 = 0;
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }

        tick += 1;
        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(tick, "Poller stopped with a fetch in flight; result discarded");
                break;
            }
            result = fetch_once(&mut fetch, fetch_timeout) => result,
        };

        // No await between this check and the callbacks below.
        if cancel.is_cancelled() {
            tracing::warn!(tick, "Poller stopped before delivery; result discarded");
            break;
        }

        match fetched {
            Ok(value) => {
                observer.on_data(&value);
                if observer.is_complete(&value) {
                    if !cancel.is_cancelled() {
                        observer.on_completed();
                    }
                    tracing::debug!(tick, "Poller completed");
                    break;
                }
            }
            Err(error) => {
                tracing::debug!(tick, "Poller fetch failed; stopping");
                observer.on_error(error);
                break;
            }
        }
    }
}

async fn fetch_once<T, E, F, Fut>(fetch: &mut F, timeout: Option<Duration>) -> Result<T, PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let pending = fetch();
    match timeout {
        Some(limit) => match tokio::time::timeout(limit, pending).await {
            Ok(result) => result.map_err(PollError::Fetch),
            Err(_) => Err(PollError::Timeout(limit)),
        },
        None => pending.await.map_err(PollError::Fetch),
    }
}

/// Owner's handle to a running poller.
///
/// `stop` is cooperative: a fetch already in flight is dropped the next
/// time the poller task runs, and its result is never delivered. On a
/// multi-threaded runtime a callback that had already started when `stop`
/// was called runs to completion; owners needing a hard barrier check their
/// own state under a lock, as `JobMachine` does with session generations.
#[derive(Debug)]
pub struct PollHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Cancel the loop. A fetch in flight is dropped without being delivered.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled() || self.task.is_finished()
    }

    /// Wait for the poller task to exit.
    pub async fn wait(&mut self) {
        let _ = (&mut self.task).await;
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
