use std::sync::Arc;
use talkreel_core::{
    config::ServiceStatus, Config, JobStore, PipelineOrchestrator, SanitizedConfig,
};

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: Arc<PipelineOrchestrator>,
}

impl AppState {
    pub fn new(config: Config, orchestrator: Arc<PipelineOrchestrator>) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn service_status(&self) -> ServiceStatus {
        ServiceStatus::from(&self.config)
    }

    pub fn orchestrator(&self) -> &Arc<PipelineOrchestrator> {
        &self.orchestrator
    }

    pub fn job_store(&self) -> &dyn JobStore {
        self.orchestrator.store().as_ref()
    }
}
