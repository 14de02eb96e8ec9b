// crates/types/src/lib.rs
//! Shared data types for bulk-add job tracking.
//!
//! Nothing in here performs I/O. The tracking core, the HTTP client and the
//! simulated server all speak in these types.

pub mod collection;
pub mod job;
pub mod request;

pub use collection::{Collection, CollectionId, CollectionPage, Company, CompanyId};
pub use job::{JobHandle, JobId, JobState, JobStatus, SubmitOutcome};
pub use request::SubmissionRequest;
