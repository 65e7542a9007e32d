//! Trait definitions for publication channels.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::job::JobContext;

use super::error::PublishError;

/// A destination the finished video can be published to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Telegram,
    YouTube,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Telegram, Channel::YouTube];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Telegram => "telegram",
            Channel::YouTube => "youtube",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "telegram" => Ok(Channel::Telegram),
            "youtube" => Ok(Channel::YouTube),
            other => Err(format!("unknown channel: {}", other)),
        }
    }
}

/// What a channel uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub video_path: PathBuf,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail: Option<PathBuf>,
}

impl PublishRequest {
    /// Description text, treating blank as absent.
    pub fn description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}

/// Uploads a finished video to one channel.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// The channel this publisher serves.
    fn channel(&self) -> Channel;

    /// Publish the video and return the channel's success descriptor.
    async fn publish(
        &self,
        ctx: &JobContext,
        request: &PublishRequest,
    ) -> Result<String, PublishError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_names() {
        assert_eq!(Channel::Telegram.to_string(), "telegram");
        assert_eq!(
            serde_json::to_string(&Channel::YouTube).unwrap(),
            "\"youtube\""
        );
        assert_eq!("YouTube".parse::<Channel>().unwrap(), Channel::YouTube);
        assert!("facebook".parse::<Channel>().is_err());
    }

    #[test]
    fn test_blank_description_is_absent() {
        let request = PublishRequest {
            video_path: PathBuf::from("/v.mp4"),
            title: "T".to_string(),
            description: Some("  ".to_string()),
            thumbnail: None,
        };
        assert_eq!(request.description(), None);
    }
}
