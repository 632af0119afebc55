use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix of environment overrides.
const ENV_PREFIX: &str = "KONVERTER_";

/// Separates nested keys in an override: `KONVERTER_BACKEND__LOCAL__FFMPEG_PATH`.
const ENV_NESTING: &str = "__";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    Figment::new()
        .merge(Toml::file(path))
        // KONVERTER_CONFIG names the file itself
        .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]).split(ENV_NESTING))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
