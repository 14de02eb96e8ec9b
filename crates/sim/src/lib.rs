// crates/sim/src/lib.rs
//! Simulated bulk-add server.
//!
//! Provides:
//! - `Store` — collections, companies and memberships in memory
//! - `JobRunner` — background insert jobs with cancellation
//! - `SimulatedJobsApi` — `JobsApi` served from the two above

pub mod api;
pub mod jobs;
pub mod seed;
pub mod store;

pub use api::SimulatedJobsApi;
pub use jobs::{JobRecord, JobRunner};
pub use seed::{SimConfig, LIKED_COLLECTION, IGNORE_COLLECTION, MY_LIST};
pub use store::Store;
