use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Default stock clip count lies within 1..=max
/// - Collaborator timeouts are non-zero
/// - Telegram token and chat id are set together
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let orchestrator = &config.orchestrator;
    if orchestrator.max_stock_clip_count == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.max_stock_clip_count cannot be 0".to_string(),
        ));
    }
    if orchestrator.default_stock_clip_count == 0
        || orchestrator.default_stock_clip_count > orchestrator.max_stock_clip_count
    {
        return Err(ConfigError::ValidationError(format!(
            "orchestrator.default_stock_clip_count must be between 1 and {}",
            orchestrator.max_stock_clip_count
        )));
    }

    let timeouts = [
        ("downloader.http_timeout_secs", config.downloader.http_timeout_secs),
        ("downloader.ytdlp_timeout_secs", config.downloader.ytdlp_timeout_secs),
        ("ffmpeg.enhance_timeout_secs", config.ffmpeg.enhance_timeout_secs),
        ("ffmpeg.compose_timeout_secs", config.ffmpeg.compose_timeout_secs),
        ("ffmpeg.probe_timeout_secs", config.ffmpeg.probe_timeout_secs),
        ("pexels.timeout_secs", config.pexels.timeout_secs),
        ("thumbnail.timeout_secs", config.thumbnail.timeout_secs),
        ("telegram.timeout_secs", config.telegram.timeout_secs),
        ("youtube.timeout_secs", config.youtube.timeout_secs),
    ];
    if let Some((name, _)) = timeouts.iter().find(|(_, secs)| *secs == 0) {
        return Err(ConfigError::ValidationError(format!("{} cannot be 0", name)));
    }

    if config.telegram.bot_token.is_some() != config.telegram.chat_id.is_some() {
        return Err(ConfigError::ValidationError(
            "telegram.bot_token and telegram.chat_id must be set together".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_clip_count_above_max_fails() {
        let mut config = Config::default();
        config.orchestrator.default_stock_clip_count = 30;
        config.orchestrator.max_stock_clip_count = 20;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("default_stock_clip_count"));
    }

    #[test]
    fn test_validate_zero_timeout_fails() {
        let mut config = Config::default();
        config.ffmpeg.compose_timeout_secs = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("ffmpeg.compose_timeout_secs"));
    }

    #[test]
    fn test_validate_half_configured_telegram_fails() {
        let mut config = Config::default();
        config.telegram.bot_token = Some("token".to_string());
        assert!(validate_config(&config).is_err());

        config.telegram.chat_id = Some("chat".to_string());
        assert!(validate_config(&config).is_ok());
    }
}
