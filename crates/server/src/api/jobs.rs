//! Job API handlers.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::warn;

use talkreel_core::{
    job::JobSummary,
    orchestrator::{OrchestratorStatus, PipelineRequest},
    Channel, Job, JobStatus, OrchestratorConfig, OrchestratorError, Outcome, Stage,
};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for submitting a job.
///
/// Everything but the audio and title falls back to the `[orchestrator]`
/// defaults.
#[derive(Debug, Default, Deserialize)]
pub struct CreateJobBody {
    #[serde(default)]
    pub audio_url: String,
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub stock_clip_count: Option<u32>,
    pub generate_thumbnail: Option<bool>,
    pub thumbnail_prompt: Option<String>,
    pub channels: Option<Vec<Channel>>,
    /// Older clients select channels with one flag each.
    pub publish_telegram: Option<bool>,
    pub publish_youtube: Option<bool>,
}

impl CreateJobBody {
    fn into_request(self, config: &OrchestratorConfig) -> PipelineRequest {
        let channels = self.resolve_channels(config);
        let mut request = PipelineRequest::new(self.audio_url, self.title, config)
            .with_channels(channels);

        if let Some(description) = self.description {
            request = request.with_description(description);
        }
        if let Some(count) = self.stock_clip_count {
            request = request.with_stock_clip_count(count);
        }
        request.with_thumbnail(
            self.generate_thumbnail
                .unwrap_or(config.generate_thumbnail_by_default),
            self.thumbnail_prompt,
        )
    }

    fn resolve_channels(&self, config: &OrchestratorConfig) -> Vec<Channel> {
        if let Some(channels) = &self.channels {
            return channels.clone();
        }
        if self.publish_telegram.is_none() && self.publish_youtube.is_none() {
            return config.default_channels.clone();
        }

        let defaults = &config.default_channels;
        [
            (Channel::Telegram, self.publish_telegram),
            (Channel::YouTube, self.publish_youtube),
        ]
        .into_iter()
        .filter(|(channel, flag)| flag.unwrap_or_else(|| defaults.contains(channel)))
        .map(|(channel, _)| channel)
        .collect()
    }
}

/// Response for an accepted job.
#[derive(Debug, Serialize)]
pub struct CreateJobResponse {
    pub job_id: String,
    pub status: JobStatus,
}

/// Full view of a job.
#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub id: String,
    pub status: JobStatus,
    pub step: Option<Stage>,
    pub progress: u8,
    pub error: Option<String>,
    pub output_path: Option<String>,
    /// Thumbnail path, or `Error: ...` when generation failed.
    pub thumbnail_path: Option<String>,
    /// Result per requested channel, in the same form.
    pub publications: BTreeMap<Channel, String>,
    pub telegram_result: Option<String>,
    pub youtube_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub finished_at: Option<String>,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        let channel_result = |channel| job.publication(channel).map(Outcome::to_string);
        let telegram_result = channel_result(Channel::Telegram);
        let youtube_url = channel_result(Channel::YouTube);

        Self {
            thumbnail_path: job.thumbnail_path(),
            publications: job
                .publications
                .iter()
                .map(|(channel, outcome)| (*channel, outcome.to_string()))
                .collect(),
            telegram_result,
            youtube_url,
            id: job.id,
            status: job.status,
            step: job.step,
            progress: job.progress,
            error: job.error,
            output_path: job.output_path,
            created_at: job.created_at.to_rfc3339(),
            updated_at: job.updated_at.to_rfc3339(),
            finished_at: job.finished_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Response for listing jobs
#[derive(Debug, Serialize)]
pub struct ListJobsResponse {
    pub jobs: Vec<JobSummary>,
    pub total: usize,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct JobErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(JobErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

fn not_found(what: &str, id: &str) -> Response {
    error_response(StatusCode::NOT_FOUND, format!("{} not found for job {}", what, id))
}

// ============================================================================
// Handlers
// ============================================================================

/// Submit a new job
pub async fn create_job(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateJobBody>,
) -> Response {
    let orchestrator = state.orchestrator();
    let request = body.into_request(orchestrator.config());

    match orchestrator.submit(request).await {
        Ok(job_id) => (
            StatusCode::ACCEPTED,
            Json(CreateJobResponse {
                job_id,
                status: JobStatus::Pending,
            }),
        )
            .into_response(),
        Err(OrchestratorError::InvalidRequest(message)) => {
            error_response(StatusCode::BAD_REQUEST, message)
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// Get a job by ID
pub async fn get_job(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.job_store().get(&id) {
        Ok(Some(job)) => Json(JobResponse::from(job)).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, format!("Job not found: {}", id)),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// List jobs, newest first
pub async fn list_jobs(State(state): State<Arc<AppState>>) -> Response {
    match state.job_store().list() {
        Ok(jobs) => {
            let total = jobs.len();
            Json(ListJobsResponse { jobs, total }).into_response()
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// Download the produced video
pub async fn get_output(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Request<Body>,
) -> Response {
    let job = match state.job_store().get(&id) {
        Ok(Some(job)) => job,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, format!("Job not found: {}", id)),
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    match job.output_path {
        Some(path) => serve_artifact(&path, request).await,
        None => not_found("Output", &id),
    }
}

/// Download the generated thumbnail
pub async fn get_thumbnail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Request<Body>,
) -> Response {
    let job = match state.job_store().get(&id) {
        Ok(Some(job)) => job,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, format!("Job not found: {}", id)),
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    // A failed generation leaves an annotation, not a file.
    match job.thumbnail.as_ref().and_then(Outcome::value) {
        Some(path) => serve_artifact(path, request).await,
        None => not_found("Thumbnail", &id),
    }
}

async fn serve_artifact(path: &str, request: Request<Body>) -> Response {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        warn!(path = %path, "Artifact recorded but missing on disk");
        return error_response(StatusCode::NOT_FOUND, format!("File not found: {}", path));
    }

    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// Active jobs and counts by status
pub async fn get_orchestrator_status(State(state): State<Arc<AppState>>) -> Response {
    match state.orchestrator().status().await {
        Ok(status) => Json::<OrchestratorStatus>(status).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
