//! Pipeline orchestrator.
//!
//! The orchestrator owns the job lifecycle after submission:
//! - **Submission**: validates the request, creates the pending record and
//!   returns the job id immediately
//! - **Run**: one supervised task per job drives the stages in order
//! - **Publishing**: the only point where one job does several things at once

mod config;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::{new_job_id, PipelineOrchestrator};
pub use types::{
    JobCounts, OrchestratorError, OrchestratorStatus, PipelineRequest, PipelineServices,
};
