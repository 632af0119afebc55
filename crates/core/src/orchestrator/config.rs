//! Orchestrator configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the conversion orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Delay between a successful batch and the automatic reset (milliseconds).
    #[serde(default = "default_reset_delay")]
    pub reset_delay_ms: u64,
}

fn default_reset_delay() -> u64 {
    2000 // 2 seconds
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            reset_delay_ms: default_reset_delay(),
        }
    }
}

impl OrchestratorConfig {
    pub fn with_reset_delay_ms(reset_delay_ms: u64) -> Self {
        Self { reset_delay_ms }
    }

    /// Reset delay as a [`Duration`].
    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.reset_delay_ms, 2000);
        assert_eq!(config.reset_delay(), Duration::from_secs(2));
    }

    #[test]
    fn test_deserialize() {
        let config: OrchestratorConfig = toml::from_str("").unwrap();
        assert_eq!(config.reset_delay_ms, 2000);

        let config: OrchestratorConfig = toml::from_str("reset_delay_ms = 50").unwrap();
        assert_eq!(config.reset_delay_ms, 50);
    }
}
