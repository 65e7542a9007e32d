pub mod config;
pub mod downloader;
mod fetch;
pub mod job;
pub mod media;
pub mod metrics;
pub mod orchestrator;
mod process;
pub mod publisher;
pub mod stock;
pub mod testing;
pub mod thumbnail;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use job::{InMemoryJobStore, Job, JobError, JobStatus, JobStore, Outcome, Stage};
pub use orchestrator::{
    OrchestratorConfig, OrchestratorError, PipelineOrchestrator, PipelineRequest,
    PipelineServices,
};
pub use publisher::Channel;
