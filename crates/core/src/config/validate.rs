use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Tracker section exists (enforced by serde)
/// - Tracker URL and credentials are non-empty
/// - Run interval is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.tracker.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "tracker.url cannot be empty".to_string(),
        ));
    }

    if config.tracker.email.is_empty() || config.tracker.api_token.is_empty() {
        return Err(ConfigError::ValidationError(
            "tracker.email and tracker.api_token must both be set".to_string(),
        ));
    }

    if config.execution.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "execution.interval_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}
