// crates/core/src/lib.rs
//! Bulk-add job tracking core: poller, job state machine, submission
//! controller and the tracking surface guard.

pub mod api;
pub mod config;
pub mod error;
pub mod guard;
pub mod machine;
pub mod mutation;
pub mod poller;
pub mod session;
pub mod targets;
pub mod view;

pub use api::JobsApi;
pub use config::{TrackerConfig, DEFAULT_POLL_INTERVAL, DEFAULT_WARNING_DELAY};
pub use error::*;
pub use guard::{Confirmed, NoopListener, SurfaceListener, TrackingGuard};
pub use machine::{JobEvents, JobMachine, NoEvents};
pub use mutation::{Mutation, MutationState, SubmissionController};
pub use poller::{PollHandle, PollObserver, Poller};
pub use session::{JobPhase, SharedSession, StatusApplied, TrackingSession};
pub use targets::{default_target, target_choices};
pub use view::{project, status_label, JobView};

pub use bulkadd_types as types;
