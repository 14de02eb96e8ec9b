// crates/sim/src/api.rs
//! `JobsApi` served from an in-memory store.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bulkadd_core::{ApiError, JobsApi};
use bulkadd_types::{
    Collection, CollectionId, CollectionPage, CompanyId, JobId, JobStatus, SubmissionRequest, SubmitOutcome,
};

use crate::jobs::JobRunner;
use crate::seed::SimConfig;
use crate::store::Store;

/// A bulk-add server living in the current process.
///
/// Follows the real server's rules: companies already in the target are
/// skipped, an add with nothing new finishes synchronously, and everything
/// else becomes a job inserting one company per `insert_delay`.
pub struct SimulatedJobsApi {
    store: Arc<Mutex<Store>>,
    runner: JobRunner,
    config: SimConfig,
}

impl SimulatedJobsApi {
    pub fn new(config: SimConfig) -> Self {
        let store = Store::seeded(config.companies);
        Self::with_store(store, config)
    }

    pub fn with_store(store: Store, config: SimConfig) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            runner: JobRunner::new(),
            config,
        }
    }

    pub fn runner(&self) -> &JobRunner {
        &self.runner
    }

    /// Look up a collection id by its display name.
    pub fn collection_id(&self, name: &str) -> Option<CollectionId> {
        lock(&self.store).find_collection(name).map(|c| c.id.clone())
    }

    pub fn members(&self, collection: &CollectionId) -> Vec<CompanyId> {
        lock(&self.store).members(collection).to_vec()
    }

    /// Companies the request would add, in insertion order.
    fn plan(&self, request: &SubmissionRequest) -> Result<Vec<CompanyId>, ApiError> {
        let store = lock(&self.store);
        let target = request.target();
        if !store.has_collection(target) {
            return Err(ApiError::NotFound("Collection not found.".into()));
        }

        let candidates: Vec<CompanyId> = match request {
            SubmissionRequest::Selected { company_ids, .. } => {
                let missing: Vec<_> = company_ids.iter().filter(|id| !store.has_company(**id)).collect();
                if !missing.is_empty() {
                    return Err(ApiError::NotFound(format!(
                        "Companies with IDs {missing:?} do not exist."
                    )));
                }
                company_ids.iter().copied().collect()
            }
            SubmissionRequest::WholeCollection { source, .. } => {
                if !store.has_collection(source) {
                    return Err(ApiError::NotFound("Source collection not found.".into()));
                }
                store.members(source).to_vec()
            }
        };

        Ok(candidates
            .into_iter()
            .filter(|id| !store.contains(target, *id))
            .collect())
    }
}

fn lock(store: &Mutex<Store>) -> MutexGuard<'_, Store> {
    store.lock().unwrap_or_else(|poisoned| {
        tracing::error!("Mutex poisoned in simulated store; recovering");
        poisoned.into_inner()
    })
}

#[async_trait]
impl JobsApi for SimulatedJobsApi {
    async fn submit_bulk_add(&self, request: &SubmissionRequest) -> Result<SubmitOutcome, ApiError> {
        let new_ids = self.plan(request)?;
        if new_ids.is_empty() {
            tracing::debug!(target_collection = %request.target(), "Nothing new to add");
            return Ok(SubmitOutcome::Synchronous);
        }

        let store = Arc::clone(&self.store);
        let target = request.target().clone();
        let delay = self.config.insert_delay;
        let fail_after = self.config.fail_after;
        let job = self.runner.start_job(new_ids.len() as u64, move |job| async move {
            for company_id in new_ids {
                tokio::time::sleep(delay).await;
                // Re-read right before writing; a cancel may land during the sleep.
                if job.is_cancelled() {
                    return Ok(());
                }
                if fail_after == Some(job.added()) {
                    return Err(format!("Insert of company {company_id} failed"));
                }
                lock(&store).insert(&target, company_id);
                job.increment();
            }
            Ok(())
        });

        tracing::info!(job_id = job.id(), total = job.snapshot().total, "Simulated bulk add job started");
        Ok(SubmitOutcome::Queued(job.id()))
    }

    async fn get_job_status(&self, job_id: JobId) -> Result<JobStatus, ApiError> {
        self.runner
            .get(job_id)
            .map(|job| job.snapshot())
            .ok_or_else(|| ApiError::NotFound("Job not found".into()))
    }

    async fn cancel_job(&self, job_id: JobId) -> Result<JobStatus, ApiError> {
        let job = self
            .runner
            .get(job_id)
            .ok_or_else(|| ApiError::NotFound("Job not found".into()))?;
        if !job.cancel() {
            return Err(ApiError::Rejected("Job cannot be cancelled".into()));
        }
        tracing::info!(job_id, "Simulated job cancelled");
        Ok(job.snapshot())
    }

    async fn list_collections(&self) -> Result<Vec<Collection>, ApiError> {
        Ok(lock(&self.store).collections().to_vec())
    }

    async fn list_collection_items(
        &self,
        collection_id: &CollectionId,
        offset: u64,
        limit: u64,
    ) -> Result<CollectionPage, ApiError> {
        lock(&self.store)
            .page(collection_id, offset, limit)
            .ok_or_else(|| ApiError::NotFound("Collection not found.".into()))
    }
}
