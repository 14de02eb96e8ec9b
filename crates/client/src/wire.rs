// crates/client/src/wire.rs
//! JSON bodies exchanged with the server.

use std::collections::BTreeSet;

use bulkadd_core::ApiError;
use bulkadd_types::{CollectionId, CompanyId, JobId, JobState, JobStatus, SubmissionRequest};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum AddCompaniesBody<'a> {
    Ids { company_ids: &'a BTreeSet<CompanyId> },
    Source { source_collection_id: &'a CollectionId },
}

impl<'a> From<&'a SubmissionRequest> for AddCompaniesBody<'a> {
    fn from(request: &'a SubmissionRequest) -> Self {
        match request {
            SubmissionRequest::Selected { company_ids, .. } => Self::Ids { company_ids },
            SubmissionRequest::WholeCollection { source, .. } => Self::Source {
                source_collection_id: source,
            },
        }
    }
}

/// `null` means the server had nothing left to do in the background.
#[derive(Debug, Deserialize)]
pub(crate) struct AddCompaniesResponse {
    pub bulk_add_job_id: Option<JobId>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkAddJobBody {
    /// Older servers omit it.
    #[serde(default, alias = "bulk_add_job_id")]
    pub id: Option<JobId>,
    pub status: JobState,
    #[serde(default)]
    pub added: u64,
    #[serde(default)]
    pub total: u64,
}

impl BulkAddJobBody {
    /// The status of `requested`, refusing a body that describes another job.
    pub fn into_status(self, requested: JobId) -> Result<JobStatus, ApiError> {
        match self.id {
            Some(id) if id != requested => Err(ApiError::Decode(format!(
                "asked for job {requested} but the server answered for job {id}"
            ))),
            _ => Ok(JobStatus::new(self.status, self.added, self.total)),
        }
    }
}

/// FastAPI-style error body. `detail` is usually a string but validation
/// errors carry a list.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: serde_json::Value,
}

impl ErrorBody {
    pub fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}
