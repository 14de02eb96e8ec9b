// crates/core/src/mutation.rs
//! Single-flight mutation wrapper and the bulk-add submission controller.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use bulkadd_types::{SubmissionRequest, SubmitOutcome};

use crate::api::JobsApi;
use crate::error::{ApiError, MutationError};

/// Observable state of a mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationState<T> {
    pub loading: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> Default for MutationState<T> {
    fn default() -> Self {
        Self {
            loading: false,
            data: None,
            error: None,
        }
    }
}

/// Runs at most one operation at a time and remembers its last outcome.
///
/// A second `run` while one is in flight is rejected with
/// [`MutationError::InFlight`]; its future is never polled.
pub struct Mutation<T> {
    state: Arc<Mutex<MutationState<T>>>,
}

impl<T> Default for Mutation<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Mutation<T> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MutationState::default())),
        }
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.state).loading
    }
}

impl<T: Clone> Mutation<T> {
    pub fn snapshot(&self) -> MutationState<T> {
        lock(&self.state).clone()
    }

    pub async fn run<Fut>(&self, operation: Fut) -> Result<T, MutationError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let _loading = self.begin()?;
        match operation.await {
            Ok(value) => {
                let mut state = lock(&self.state);
                state.data = Some(value.clone());
                state.error = None;
                Ok(value)
            }
            Err(e) => {
                let mut state = lock(&self.state);
                state.data = None;
                state.error = Some(e.to_string());
                Err(MutationError::Api(e))
            }
        }
    }

    fn begin(&self) -> Result<LoadingGuard<T>, MutationError> {
        let mut state = lock(&self.state);
        if state.loading {
            return Err(MutationError::InFlight);
        }
        state.loading = true;
        state.error = None;
        Ok(LoadingGuard {
            state: Arc::clone(&self.state),
        })
    }
}

/// Clears `loading` however the run ends, including when the caller drops
/// the future mid-flight.
struct LoadingGuard<T> {
    state: Arc<Mutex<MutationState<T>>>,
}

impl<T> Drop for LoadingGuard<T> {
    fn drop(&mut self) {
        lock(&self.state).loading = false;
    }
}

fn lock<T>(state: &Mutex<MutationState<T>>) -> MutexGuard<'_, MutationState<T>> {
    state.lock().unwrap_or_else(|poisoned| {
        tracing::error!("Mutex poisoned in mutation state; recovering");
        poisoned.into_inner()
    })
}

/// Issues the "start bulk add" call, one at a time.
pub struct SubmissionController {
    api: Arc<dyn JobsApi>,
    mutation: Mutation<SubmitOutcome>,
}

impl SubmissionController {
    pub fn new(api: Arc<dyn JobsApi>) -> Self {
        Self {
            api,
            mutation: Mutation::new(),
        }
    }

    pub async fn submit(&self, request: &SubmissionRequest) -> Result<SubmitOutcome, MutationError> {
        tracing::debug!(
            target_collection = %request.target(),
            items = %request.describe(),
            "Submitting bulk add"
        );
        let result = self.mutation.run(self.api.submit_bulk_add(request)).await;
        match &result {
            Ok(outcome) => tracing::info!(?outcome, "Bulk add accepted"),
            Err(e) => tracing::warn!(error = %e, "Bulk add submission failed"),
        }
        result
    }

    pub fn state(&self) -> MutationState<SubmitOutcome> {
        self.mutation.snapshot()
    }

    pub fn is_loading(&self) -> bool {
        self.mutation.is_loading()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_success_stores_data_and_clears_error() {
        let mutation: Mutation<u32> = Mutation::new();
        let _ = mutation
            .run(async { Err(ApiError::Network("down".into())) })
            .await;
        assert!(mutation.snapshot().error.is_some());

        let value = mutation.run(async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
        let state = mutation.snapshot();
        assert_eq!(state.data, Some(7));
        assert_eq!(state.error, None);
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_failure_stores_error_and_clears_data() {
        let mutation: Mutation<u32> = Mutation::new();
        mutation.run(async { Ok(1) }).await.unwrap();

        let err = mutation
            .run(async { Err(ApiError::from_status(500, "boom")) })
            .await
            .unwrap_err();
        assert!(matches!(err, MutationError::Api(ApiError::Status { status: 500, .. })));
        let state = mutation.snapshot();
        assert_eq!(state.data, None);
        assert_eq!(state.error.as_deref(), Some("Server returned 500: boom"));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_second_run_rejected_while_in_flight() {
        let mutation: Arc<Mutation<u32>> = Arc::new(Mutation::new());
        let (release, wait) = oneshot::channel::<()>();

        let first = {
            let mutation = Arc::clone(&mutation);
            tokio::spawn(async move {
                mutation
                    .run(async move {
                        let _ = wait.await;
                        Ok(1)
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;
        assert!(mutation.is_loading());

        let polled = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = Arc::clone(&polled);
        let second = mutation
            .run(async move {
                flag.store(true, std::sync::atomic::Ordering::SeqCst);
                Ok(2)
            })
            .await;
        assert!(matches!(second, Err(MutationError::InFlight)));
        assert!(!polled.load(std::sync::atomic::Ordering::SeqCst));

        release.send(()).unwrap();
        assert_eq!(first.await.unwrap().unwrap(), 1);
        assert!(!mutation.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_future_still_resets_loading() {
        let mutation: Mutation<u32> = Mutation::new();
        let slow = mutation.run(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(1)
        });
        let timed_out = tokio::time::timeout(Duration::from_millis(10), slow).await;
        assert!(timed_out.is_err());
        assert!(!mutation.is_loading());
    }
}
