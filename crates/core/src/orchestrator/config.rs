//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

use crate::publisher::Channel;

/// Defaults and limits applied to submitted jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Stock clips fetched when a submission does not say.
    #[serde(default = "default_stock_clip_count")]
    pub default_stock_clip_count: u32,

    /// Upper bound on the stock clip count a submission may ask for.
    #[serde(default = "default_max_stock_clip_count")]
    pub max_stock_clip_count: u32,

    /// Whether a thumbnail is generated when a submission does not say.
    #[serde(default = "default_generate_thumbnail")]
    pub generate_thumbnail_by_default: bool,

    /// Channels published to when a submission does not name any.
    #[serde(default = "default_channels")]
    pub default_channels: Vec<Channel>,
}

fn default_stock_clip_count() -> u32 {
    5
}

fn default_max_stock_clip_count() -> u32 {
    20
}

fn default_generate_thumbnail() -> bool {
    true
}

fn default_channels() -> Vec<Channel> {
    vec![Channel::Telegram]
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            default_stock_clip_count: default_stock_clip_count(),
            max_stock_clip_count: default_max_stock_clip_count(),
            generate_thumbnail_by_default: default_generate_thumbnail(),
            default_channels: default_channels(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.default_stock_clip_count, 5);
        assert_eq!(config.max_stock_clip_count, 20);
        assert!(config.generate_thumbnail_by_default);
        assert_eq!(config.default_channels, vec![Channel::Telegram]);
    }

    #[test]
    fn test_deserialize_minimal() {
        let toml = r#"
            max_stock_clip_count = 8
        "#;
        let config: OrchestratorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.max_stock_clip_count, 8);
        assert_eq!(config.default_stock_clip_count, 5);
        assert!(config.generate_thumbnail_by_default);
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
            default_stock_clip_count = 3
            max_stock_clip_count = 10
            generate_thumbnail_by_default = false
            default_channels = ["youtube", "telegram"]
        "#;
        let config: OrchestratorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.default_stock_clip_count, 3);
        assert_eq!(config.max_stock_clip_count, 10);
        assert!(!config.generate_thumbnail_by_default);
        assert_eq!(
            config.default_channels,
            vec![Channel::YouTube, Channel::Telegram]
        );
    }
}
