// crates/core/src/api.rs
//! JobsApi trait: the server boundary the tracker consumes.

use async_trait::async_trait;
use bulkadd_types::{Collection, CollectionId, CollectionPage, JobId, JobStatus, SubmissionRequest, SubmitOutcome};

use crate::error::ApiError;

/// Operations the bulk-add server exposes.
///
/// Implementations:
/// - `HttpJobsApi` (bulkadd-client), talking REST to a real server
/// - `SimulatedJobsApi` (bulkadd-sim), an in-process stand-in
#[async_trait]
pub trait JobsApi: Send + Sync {
    /// Create a bulk-add job. `Synchronous` means nothing was left to do
    /// in the background.
    async fn submit_bulk_add(&self, request: &SubmissionRequest) -> Result<SubmitOutcome, ApiError>;

    /// Current status of a job.
    async fn get_job_status(&self, job_id: JobId) -> Result<JobStatus, ApiError>;

    /// Ask the server to cancel a job. Returns the status after cancellation.
    async fn cancel_job(&self, job_id: JobId) -> Result<JobStatus, ApiError>;

    async fn list_collections(&self) -> Result<Vec<Collection>, ApiError>;

    async fn list_collection_items(
        &self,
        collection_id: &CollectionId,
        offset: u64,
        limit: u64,
    ) -> Result<CollectionPage, ApiError>;
}
