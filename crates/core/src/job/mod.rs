//! Job records and the registry that owns them.

mod memory_store;
mod stage;
mod store;
mod types;

pub use memory_store::InMemoryJobStore;
pub use stage::{FailurePolicy, Stage};
pub use store::{JobError, JobStore};
pub use types::{
    Job, JobContext, JobStatus, JobSummary, JobUpdate, Outcome, ERROR_ANNOTATION_PREFIX,
};
