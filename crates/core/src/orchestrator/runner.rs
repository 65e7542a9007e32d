//! Pipeline orchestrator implementation.
//!
//! Runs the fixed stage sequence for each submitted job:
//! - Stages of one job run strictly in order, one after another
//! - Jobs run concurrently, each in its own supervised task
//! - Publishing fans out to every requested channel at once

use std::collections::HashSet;
use std::fmt::Display;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::job::{
    FailurePolicy, Job, JobContext, JobError, JobStatus, JobStore, JobUpdate, Outcome, Stage,
};
use crate::metrics;
use crate::publisher::{Channel, PublishRequest};
use crate::stock::StockError;

use super::config::OrchestratorConfig;
use super::types::{
    JobCounts, OrchestratorError, OrchestratorStatus, PipelineRequest, PipelineServices,
};

/// Length of generated job identifiers, in hex characters.
const JOB_ID_LEN: usize = 12;

/// New job identifier: the first 12 hex characters of a v4 UUID.
pub fn new_job_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(JOB_ID_LEN);
    id
}

/// A stage result after its failure policy has been applied.
enum Settled<T> {
    Done(T),
    /// Failure the job survives; the message is recorded where the stage's
    /// value would have gone.
    Tolerated(String),
    /// Failure that ends the job.
    Aborted(String),
}

impl<T> Settled<T> {
    fn new<E: Display>(stage: Stage, result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Settled::Done(value),
            Err(e) => match stage.failure_policy() {
                FailurePolicy::Fatal => Settled::Aborted(e.to_string()),
                FailurePolicy::Annotate
                | FailurePolicy::PerChannel
                | FailurePolicy::BestEffort
                | FailurePolicy::Infallible => Settled::Tolerated(e.to_string()),
            },
        }
    }

    /// The value, for stages whose output the rest of the pipeline needs.
    fn required(self) -> Result<T, Interrupt> {
        match self {
            Settled::Done(value) => Ok(value),
            Settled::Tolerated(message) | Settled::Aborted(message) => {
                Err(Interrupt::Failed(message))
            }
        }
    }

    fn into_outcome(self) -> Outcome
    where
        T: Display,
    {
        match self {
            Settled::Done(value) => Outcome::ok(value.to_string()),
            Settled::Tolerated(message) | Settled::Aborted(message) => Outcome::error(message),
        }
    }
}

/// Why the stage sequence stopped early.
enum Interrupt {
    /// A fatal stage failed.
    Failed(String),
    /// The job record could not be updated.
    Store(JobError),
}

impl From<JobError> for Interrupt {
    fn from(e: JobError) -> Self {
        Interrupt::Store(e)
    }
}

/// Files a run creates that do not outlive it.
#[derive(Debug, Default)]
struct TransientFiles {
    paths: Vec<PathBuf>,
}

/// The pipeline orchestrator - runs jobs from submission to a terminal state.
pub struct PipelineOrchestrator {
    config: OrchestratorConfig,
    store: Arc<dyn JobStore>,
    services: PipelineServices,
    active: RwLock<HashSet<String>>,
}

impl PipelineOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        config: OrchestratorConfig,
        store: Arc<dyn JobStore>,
        services: PipelineServices,
    ) -> Self {
        Self {
            config,
            store,
            services,
            active: RwLock::new(HashSet::new()),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    /// Validate and accept a request, returning the new job's identifier.
    ///
    /// The job record exists (pending) when this returns; the pipeline runs
    /// in a background task.
    pub async fn submit(
        self: &Arc<Self>,
        request: PipelineRequest,
    ) -> Result<String, OrchestratorError> {
        let request = request.validate(&self.config)?;
        let job_id = new_job_id();
        self.store.create(&job_id)?;

        metrics::JOBS_SUBMITTED.inc();
        info!(
            job_id = %job_id,
            title = %request.title,
            clips = request.stock_clip_count,
            thumbnail = request.generate_thumbnail,
            channels = ?request.channels,
            "Job submitted"
        );

        self.active.write().await.insert(job_id.clone());
        self.spawn_job(job_id.clone(), request);
        Ok(job_id)
    }

    /// Run the job in its own task, under a supervisor that fails the job if
    /// the task dies.
    fn spawn_job(self: &Arc<Self>, job_id: String, request: PipelineRequest) {
        let this = Arc::clone(self);

        tokio::spawn(async move {
            let worker = {
                let this = Arc::clone(&this);
                let job_id = job_id.clone();
                tokio::spawn(async move { this.run(&job_id, &request).await })
            };

            match worker.await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => error!(job_id = %job_id, error = %e, "Pipeline run ended without a terminal update"),
                Err(e) => {
                    error!(job_id = %job_id, error = %e, "Pipeline task aborted");
                    this.fail_abandoned(&job_id, format!("pipeline task failed: {}", e));
                }
            }

            this.active.write().await.remove(&job_id);
        });
    }

    /// Mark a job whose task died as failed, unless it already finished.
    fn fail_abandoned(&self, job_id: &str, message: String) {
        match self.store.apply(job_id, JobUpdate::Failed(message)) {
            Ok(_) => {
                metrics::JOBS_FINISHED
                    .with_label_values(&[JobStatus::Failed.as_str()])
                    .inc();
            }
            Err(JobError::InvalidState { .. }) => {}
            Err(e) => error!(job_id = %job_id, error = %e, "Failed to record abandoned job"),
        }
    }

    /// Run every stage of an existing pending job and return its final record.
    ///
    /// Every collaborator failure ends in a record update; only a failure of
    /// the store itself is returned as an error.
    pub async fn run(
        &self,
        job_id: &str,
        request: &PipelineRequest,
    ) -> Result<Job, OrchestratorError> {
        let ctx = JobContext::new(job_id);
        let started = Instant::now();

        let job = match self.run_stages(&ctx, request).await {
            Ok(()) => self.store.apply(job_id, JobUpdate::Completed)?,
            Err(Interrupt::Failed(message)) => {
                self.store.apply(job_id, JobUpdate::Failed(message))?
            }
            Err(Interrupt::Store(e)) => {
                error!(job_id = %job_id, error = %e, "Job record update failed");
                self.store
                    .apply(job_id, JobUpdate::Failed(e.to_string()))
                    .map_err(|_| e)?
            }
        };

        let elapsed = started.elapsed().as_secs_f64();
        metrics::JOBS_FINISHED
            .with_label_values(&[job.status.as_str()])
            .inc();
        metrics::JOB_DURATION
            .with_label_values(&[job.status.as_str()])
            .observe(elapsed);

        match job.status {
            JobStatus::Completed => info!(
                job_id = %job_id,
                elapsed_secs = elapsed,
                degraded = job.is_degraded(),
                "Job completed"
            ),
            _ => error!(
                job_id = %job_id,
                step = job.step_label(),
                error = job.error.as_deref().unwrap_or_default(),
                "Job failed"
            ),
        }
        Ok(job)
    }

    async fn run_stages(&self, ctx: &JobContext, request: &PipelineRequest) -> Result<(), Interrupt> {
        let services = &self.services;
        let mut transient = TransientFiles::default();

        self.enter(ctx, Stage::Downloading)?;
        let raw_audio = self
            .settle(
                Stage::Downloading,
                services.audio_source.acquire(ctx, &request.audio_reference),
            )
            .await
            .required()?;
        transient.paths.push(raw_audio.clone());

        self.enter(ctx, Stage::Enhancing)?;
        let enhanced = self
            .settle(Stage::Enhancing, services.enhancer.enhance(ctx, &raw_audio))
            .await
            .required()?;
        transient.paths.push(enhanced.clone());

        self.enter(ctx, Stage::FetchingStock)?;
        let clips = self
            .settle(Stage::FetchingStock, async {
                let clips = services.stock.fetch(ctx, request.stock_clip_count).await?;
                if clips.is_empty() {
                    return Err(StockError::NoFootage(format!(
                        "{} returned no clips",
                        services.stock.name()
                    )));
                }
                Ok(clips)
            })
            .await
            .required()?;
        transient.paths.extend(clips.iter().cloned());

        let thumbnail = if request.generate_thumbnail {
            self.enter(ctx, Stage::GeneratingThumbnail)?;
            let settled = self
                .settle(
                    Stage::GeneratingThumbnail,
                    services.thumbnails.generate(
                        ctx,
                        &request.title,
                        request.thumbnail_prompt.as_deref(),
                    ),
                )
                .await;
            let path = match &settled {
                Settled::Done(path) => Some(path.clone()),
                _ => None,
            };
            let outcome = match settled {
                Settled::Done(path) => Outcome::ok(path.display().to_string()),
                Settled::Tolerated(message) | Settled::Aborted(message) => {
                    warn!(job_id = %ctx.job_id, error = %message, "Thumbnail generation failed, continuing without");
                    Outcome::error(message)
                }
            };
            self.store
                .apply(&ctx.job_id, JobUpdate::ThumbnailRecorded(outcome))?;
            path
        } else {
            None
        };

        self.enter(ctx, Stage::Compiling)?;
        let video = self
            .settle(
                Stage::Compiling,
                services
                    .composer
                    .compose(ctx, &enhanced, &clips, &request.title),
            )
            .await
            .required()?;
        self.store.apply(
            &ctx.job_id,
            JobUpdate::OutputReady(video.display().to_string()),
        )?;

        self.enter(ctx, Stage::Publishing)?;
        let publish_request = PublishRequest {
            video_path: video,
            title: request.title.clone(),
            description: request.description.clone(),
            thumbnail,
        };
        self.publish_all(ctx, &request.channels, publish_request)
            .await?;

        self.enter(ctx, Stage::Cleanup)?;
        self.cleanup(ctx, transient).await;

        Ok(())
    }

    /// Record entry into `stage`.
    fn enter(&self, ctx: &JobContext, stage: Stage) -> Result<(), JobError> {
        let job = self
            .store
            .apply(&ctx.job_id, JobUpdate::StageStarted(stage))?;
        info!(job_id = %ctx.job_id, stage = %stage, progress = job.progress, "Stage started");
        Ok(())
    }

    /// Await a stage's collaborator call and apply the stage's failure policy.
    async fn settle<T, E, F>(&self, stage: Stage, call: F) -> Settled<T>
    where
        F: Future<Output = Result<T, E>>,
        E: Display,
    {
        let start = Instant::now();
        let result = call.await;
        let label = if result.is_ok() { "success" } else { "error" };
        metrics::STAGE_DURATION
            .with_label_values(&[stage.label(), label])
            .observe(start.elapsed().as_secs_f64());

        Settled::new(stage, result)
    }

    /// Publish to every requested channel concurrently, recording each
    /// channel's outcome as soon as it is known.
    async fn publish_all(
        &self,
        ctx: &JobContext,
        channels: &[Channel],
        request: PublishRequest,
    ) -> Result<(), JobError> {
        let request = Arc::new(request);
        let mut pending = FuturesUnordered::new();

        for &channel in channels {
            let Some(publisher) = self.services.publishers.get(&channel) else {
                self.record_channel(
                    ctx,
                    channel,
                    Settled::new(
                        Stage::Publishing,
                        Err::<String, _>(format!("no publisher configured for {}", channel)),
                    ),
                )?;
                continue;
            };

            let publisher = Arc::clone(publisher);
            let request = Arc::clone(&request);
            let task_ctx = ctx.clone();
            debug!(job_id = %ctx.job_id, channel = %channel, "Publishing");
            let handle =
                tokio::spawn(async move { publisher.publish(&task_ctx, &request).await });
            pending.push(async move { (channel, handle.await) });
        }

        while let Some((channel, joined)) = pending.next().await {
            let result = match joined {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(e) => Err(format!("publisher task failed: {}", e)),
            };
            self.record_channel(ctx, channel, Settled::new(Stage::Publishing, result))?;
        }
        Ok(())
    }

    fn record_channel(
        &self,
        ctx: &JobContext,
        channel: Channel,
        settled: Settled<String>,
    ) -> Result<(), JobError> {
        let outcome = settled.into_outcome();
        let label = if outcome.is_ok() { "success" } else { "error" };
        metrics::PUBLISH_ATTEMPTS
            .with_label_values(&[channel.as_str(), label])
            .inc();

        match &outcome {
            Outcome::Ok { value } => {
                info!(job_id = %ctx.job_id, channel = %channel, result = %value, "Channel published")
            }
            Outcome::Error { message } => {
                warn!(job_id = %ctx.job_id, channel = %channel, error = %message, "Channel publish failed")
            }
        }

        self.store
            .apply(&ctx.job_id, JobUpdate::ChannelRecorded { channel, outcome })?;
        Ok(())
    }

    /// Delete the run's transient files. Missing files are fine; any other
    /// failure is logged and ignored.
    async fn cleanup(&self, ctx: &JobContext, transient: TransientFiles) {
        for path in transient.paths {
            let result = match tokio::fs::remove_file(&path).await {
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                other => other,
            };

            match Settled::new(Stage::Cleanup, result) {
                Settled::Done(()) => {
                    metrics::FILES_CLEANED.inc();
                    debug!(job_id = %ctx.job_id, path = %path.display(), "Removed transient file");
                }
                Settled::Tolerated(message) | Settled::Aborted(message) => {
                    warn!(job_id = %ctx.job_id, path = %path.display(), error = %message, "Cleanup failed")
                }
            }
        }
    }

    /// Active jobs and job counts by status.
    pub async fn status(&self) -> Result<OrchestratorStatus, OrchestratorError> {
        let mut active_jobs: Vec<String> = self.active.read().await.iter().cloned().collect();
        active_jobs.sort();

        let mut counts = JobCounts::default();
        for summary in self.store.list()? {
            match summary.status {
                JobStatus::Pending => counts.pending += 1,
                JobStatus::Running => counts.running += 1,
                JobStatus::Completed => counts.completed += 1,
                JobStatus::Failed => counts.failed += 1,
            }
        }

        let mut channels: Vec<Channel> = self.services.publishers.keys().copied().collect();
        channels.sort();

        Ok(OrchestratorStatus {
            active_jobs,
            counts,
            channels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_shape() {
        let id = new_job_id();
        assert_eq!(id.len(), 12);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(new_job_id(), id);
    }

    #[test]
    fn test_settled_follows_policy() {
        let fatal = Settled::<()>::new(Stage::Compiling, Err::<(), _>("boom"));
        assert!(matches!(fatal, Settled::Aborted(m) if m == "boom"));

        let annotated = Settled::<()>::new(Stage::GeneratingThumbnail, Err::<(), _>("no key"));
        assert!(matches!(annotated, Settled::Tolerated(_)));

        let published = Settled::new(Stage::Publishing, Ok::<_, String>("sent".to_string()));
        assert_eq!(published.into_outcome(), Outcome::ok("sent"));
    }

    #[test]
    fn test_tolerated_outcome_is_annotated() {
        let settled = Settled::new(Stage::Publishing, Err::<String, _>("quota"));
        assert_eq!(settled.into_outcome().to_string(), "Error: quota");
    }
}
