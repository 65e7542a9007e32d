//! Job record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::publisher::Channel;

use super::stage::Stage;
use super::store::JobError;

/// Prefix used when a failure is written into a value field.
pub const ERROR_ANNOTATION_PREFIX: &str = "Error: ";

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Pending,
        JobStatus::Running,
        JobStatus::Completed,
        JobStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Terminal states are final.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a non-fatal step: a value on success, an annotation on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    Ok { value: String },
    Error { message: String },
}

impl Outcome {
    pub fn ok(value: impl Into<String>) -> Self {
        Self::Ok {
            value: value.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    /// The success value, if any.
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Ok { value } => Some(value),
            Self::Error { .. } => None,
        }
    }
}

impl<T: fmt::Display, E: fmt::Display> From<Result<T, E>> for Outcome {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Outcome::ok(value.to_string()),
            Err(e) => Outcome::error(e.to_string()),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok { value } => f.write_str(value),
            Self::Error { message } => write!(f, "{}{}", ERROR_ANNOTATION_PREFIX, message),
        }
    }
}

/// A mutation of a job record.
///
/// The orchestrator running the job is the only producer of updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobUpdate {
    /// A stage was entered.
    StageStarted(Stage),
    /// Thumbnail generation finished (successfully or not).
    ThumbnailRecorded(Outcome),
    /// Video composition produced its output.
    OutputReady(String),
    /// A publication channel finished.
    ChannelRecorded { channel: Channel, outcome: Outcome },
    /// The job finished successfully.
    Completed,
    /// A fatal stage failed.
    Failed(String),
}

impl JobUpdate {
    fn operation(&self) -> &'static str {
        match self {
            JobUpdate::StageStarted(_) => "start stage of",
            JobUpdate::ThumbnailRecorded(_) => "record thumbnail for",
            JobUpdate::OutputReady(_) => "record output for",
            JobUpdate::ChannelRecorded { .. } => "record publication for",
            JobUpdate::Completed => "complete",
            JobUpdate::Failed(_) => "fail",
        }
    }
}

/// One submitted pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    /// Current or last-attempted stage; `None` before the first stage.
    pub step: Option<Stage>,
    pub progress: u8,
    /// Set once, on the transition to failed.
    pub error: Option<String>,
    pub output_path: Option<String>,
    /// Thumbnail path, or the annotated failure.
    pub thumbnail: Option<Outcome>,
    /// Outcome per requested channel.
    pub publications: BTreeMap<Channel, Outcome>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            status: JobStatus::Pending,
            step: None,
            progress: 0,
            error: None,
            output_path: None,
            thumbnail: None,
            publications: BTreeMap::new(),
            created_at: now,
            updated_at: now,
            finished_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Label of the current step, empty before the first stage.
    pub fn step_label(&self) -> &'static str {
        self.step.map(|s| s.label()).unwrap_or("")
    }

    /// Thumbnail field as written to the record: a path or `Error: ...`.
    pub fn thumbnail_path(&self) -> Option<String> {
        self.thumbnail.as_ref().map(|t| t.to_string())
    }

    pub fn publication(&self, channel: Channel) -> Option<&Outcome> {
        self.publications.get(&channel)
    }

    /// True when the job completed but some optional result failed.
    pub fn is_degraded(&self) -> bool {
        self.status == JobStatus::Completed
            && (self.thumbnail.as_ref().is_some_and(|t| !t.is_ok())
                || self.publications.values().any(|o| !o.is_ok()))
    }

    pub fn summary(&self) -> JobSummary {
        JobSummary {
            id: self.id.clone(),
            status: self.status,
            step: self.step,
            progress: self.progress,
            created_at: self.created_at,
        }
    }

    /// Apply an update, enforcing the record's invariants.
    pub fn apply(&mut self, update: JobUpdate) -> Result<(), JobError> {
        if self.is_terminal() {
            return Err(self.invalid(update.operation()));
        }

        match update {
            JobUpdate::StageStarted(stage) => {
                if stage == Stage::Done || self.step.is_some_and(|current| current >= stage) {
                    return Err(self.invalid(&format!("start stage {} of", stage)));
                }
                self.status = JobStatus::Running;
                self.step = Some(stage);
                self.progress = self.progress.max(stage.entry_progress());
            }
            JobUpdate::ThumbnailRecorded(outcome) => {
                if self.thumbnail.is_some() {
                    return Err(self.invalid("record thumbnail twice for"));
                }
                self.thumbnail = Some(outcome);
            }
            JobUpdate::OutputReady(path) => {
                if path.is_empty() {
                    return Err(self.invalid("record an empty output for"));
                }
                self.output_path = Some(path);
            }
            JobUpdate::ChannelRecorded { channel, outcome } => {
                if self.publications.contains_key(&channel) {
                    return Err(self.invalid(&format!("record {} twice for", channel)));
                }
                self.publications.insert(channel, outcome);
            }
            JobUpdate::Completed => {
                if self.output_path.is_none() {
                    return Err(self.invalid("complete without output"));
                }
                self.status = JobStatus::Completed;
                self.step = Some(Stage::Done);
                self.progress = Stage::Done.entry_progress();
                self.finished_at = Some(Utc::now());
            }
            JobUpdate::Failed(message) => {
                let message = if message.trim().is_empty() {
                    "unknown error".to_string()
                } else {
                    message
                };
                self.status = JobStatus::Failed;
                self.error = Some(message);
                self.output_path = None;
                self.finished_at = Some(Utc::now());
            }
        }

        self.updated_at = Utc::now();
        Ok(())
    }

    fn invalid(&self, operation: &str) -> JobError {
        JobError::InvalidState {
            job_id: self.id.clone(),
            current_state: format!("{}/{}", self.status, self.step_label()),
            operation: operation.to_string(),
        }
    }
}

/// Compact view of a job used in listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: String,
    pub status: JobStatus,
    pub step: Option<Stage>,
    pub progress: u8,
    pub created_at: DateTime<Utc>,
}

/// Per-job naming scope handed to collaborators.
///
/// Every artifact a collaborator writes for a job carries the job id, so
/// concurrent jobs never touch each other's files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobContext {
    pub job_id: String,
}

impl JobContext {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
        }
    }

    /// File name for an artifact of this job, e.g. `3f2a9c_enhanced.wav`.
    pub fn artifact_name(&self, suffix: &str) -> String {
        format!("{}_{}", self.job_id, suffix)
    }
}
