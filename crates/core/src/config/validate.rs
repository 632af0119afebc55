use super::{types::Config, ConfigError};
use crate::backend::BackendKind;
use crate::settings::{is_valid_bitrate, FIXED_CHANNELS, FIXED_SAMPLE_RATE};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Remote backend has an http(s) base URL
/// - Initial bitrate looks like `192k`
/// - Initial sample rate and channel count are the fixed ones
/// - Reset delay is positive
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Backend validation
    if config.backend.kind == BackendKind::Remote {
        let remote = config.backend.remote.as_ref().ok_or_else(|| {
            ConfigError::ValidationError(
                "backend.kind = \"remote\" requires a [backend.remote] section".to_string(),
            )
        })?;
        let url = reqwest::Url::parse(remote.base()).map_err(|e| {
            ConfigError::ValidationError(format!("backend.remote.base_url is invalid: {}", e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationError(format!(
                "backend.remote.base_url must use http or https, got {}",
                url.scheme()
            )));
        }
    }

    if !is_valid_bitrate(&config.settings.bitrate) {
        return Err(ConfigError::ValidationError(format!(
            "settings.bitrate must look like \"192k\", got {:?}",
            config.settings.bitrate
        )));
    }

    if !config.settings.has_fixed_layout() {
        return Err(ConfigError::ValidationError(format!(
            "settings.sample_rate and settings.channels must be {} and {}, got {} and {}",
            FIXED_SAMPLE_RATE, FIXED_CHANNELS, config.settings.sample_rate, config.settings.channels
        )));
    }

    if config.orchestrator.reset_delay_ms == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.reset_delay_ms must be greater than 0".to_string(),
        ));
    }

    Ok(())
}
