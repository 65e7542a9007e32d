//! Job storage trait and errors.

use thiserror::Error;

use super::types::{Job, JobSummary, JobUpdate};

/// Error type for job store and record operations.
#[derive(Debug, Error)]
pub enum JobError {
    /// Job not found.
    #[error("Job not found: {0}")]
    NotFound(String),

    /// A job with this identifier already exists.
    #[error("Job already exists: {0}")]
    DuplicateId(String),

    /// The update is not allowed in the job's current state.
    #[error("Cannot {operation} job {job_id}: current state is {current_state}")]
    InvalidState {
        job_id: String,
        current_state: String,
        operation: String,
    },

    /// Backend failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Process-wide registry of job records.
///
/// Implementations must be safe to call from many job tasks and status
/// queries at once; `get` and `list` return snapshots that never show a
/// record halfway through an update.
pub trait JobStore: Send + Sync {
    /// Insert a new pending job.
    fn create(&self, id: &str) -> Result<Job, JobError>;

    /// Get a job by ID. A missing job is `Ok(None)`.
    fn get(&self, id: &str) -> Result<Option<Job>, JobError>;

    /// Summaries of all jobs, newest first.
    fn list(&self) -> Result<Vec<JobSummary>, JobError>;

    /// Apply an update to one job and return the updated snapshot.
    fn apply(&self, id: &str, update: JobUpdate) -> Result<Job, JobError>;
}
