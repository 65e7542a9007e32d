//! Pipeline stages and how each one treats a failure.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What happens to the job when a stage's collaborator fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// The job transitions to failed and no further stage runs.
    Fatal,
    /// The failure is written into the stage's own field and the job continues.
    Annotate,
    /// Each channel records its own outcome; the job never fails because of it.
    PerChannel,
    /// The failure is logged and otherwise ignored.
    BestEffort,
    /// The stage calls no collaborator.
    Infallible,
}

/// One ordered step of the pipeline.
///
/// Variants are declared in execution order; `Ord` follows that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Downloading,
    Enhancing,
    FetchingStock,
    GeneratingThumbnail,
    Compiling,
    Publishing,
    Cleanup,
    Done,
}

impl Stage {
    /// Every stage in execution order.
    pub const ALL: [Stage; 8] = [
        Stage::Downloading,
        Stage::Enhancing,
        Stage::FetchingStock,
        Stage::GeneratingThumbnail,
        Stage::Compiling,
        Stage::Publishing,
        Stage::Cleanup,
        Stage::Done,
    ];

    /// Label stored in the job record's `step` field.
    pub const fn label(&self) -> &'static str {
        match self {
            Stage::Downloading => "downloading",
            Stage::Enhancing => "enhancing",
            Stage::FetchingStock => "fetching_stock",
            Stage::GeneratingThumbnail => "generating_thumbnail",
            Stage::Compiling => "compiling",
            Stage::Publishing => "publishing",
            Stage::Cleanup => "cleanup",
            Stage::Done => "done",
        }
    }

    /// Progress percentage written when the stage is entered.
    pub const fn entry_progress(&self) -> u8 {
        match self {
            Stage::Downloading => 10,
            Stage::Enhancing => 25,
            Stage::FetchingStock => 40,
            Stage::GeneratingThumbnail => 50,
            Stage::Compiling => 65,
            Stage::Publishing => 80,
            Stage::Cleanup => 95,
            Stage::Done => 100,
        }
    }

    pub const fn failure_policy(&self) -> FailurePolicy {
        match self {
            Stage::Downloading | Stage::Enhancing | Stage::FetchingStock | Stage::Compiling => {
                FailurePolicy::Fatal
            }
            Stage::GeneratingThumbnail => FailurePolicy::Annotate,
            Stage::Publishing => FailurePolicy::PerChannel,
            Stage::Cleanup => FailurePolicy::BestEffort,
            Stage::Done => FailurePolicy::Infallible,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_progress_is_increasing() {
        for pair in Stage::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].entry_progress() < pair[1].entry_progress());
        }
        assert_eq!(Stage::Done.entry_progress(), 100);
    }

    #[test]
    fn test_only_thumbnail_is_annotated() {
        let annotated: Vec<_> = Stage::ALL
            .iter()
            .filter(|s| s.failure_policy() == FailurePolicy::Annotate)
            .collect();
        assert_eq!(annotated, vec![&Stage::GeneratingThumbnail]);
    }

    #[test]
    fn test_fatal_stages() {
        assert_eq!(Stage::Downloading.failure_policy(), FailurePolicy::Fatal);
        assert_eq!(Stage::Enhancing.failure_policy(), FailurePolicy::Fatal);
        assert_eq!(Stage::FetchingStock.failure_policy(), FailurePolicy::Fatal);
        assert_eq!(Stage::Compiling.failure_policy(), FailurePolicy::Fatal);
        assert_eq!(Stage::Publishing.failure_policy(), FailurePolicy::PerChannel);
        assert_eq!(Stage::Cleanup.failure_policy(), FailurePolicy::BestEffort);
    }

    #[test]
    fn test_serialized_label_matches() {
        for stage in Stage::ALL {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage.label()));
        }
    }
}
