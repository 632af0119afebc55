use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

use crate::backend::{BackendConfig, BackendKind, LocalBackendConfig, RemoteBackendConfig};
use crate::delivery::DeliveryConfig;
use crate::feedback::FeedbackConfig;
use crate::orchestrator::OrchestratorConfig;
use crate::settings::Settings;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
    /// Settings in effect until the user changes them.
    #[serde(default)]
    pub settings: Settings,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Sanitized config for API responses (credentials in URLs redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub backend: SanitizedBackendConfig,
    pub delivery: DeliveryConfig,
    pub orchestrator: OrchestratorConfig,
    pub feedback: FeedbackConfig,
    pub settings: Settings,
}

/// Sanitized backend config
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedBackendConfig {
    pub kind: BackendKind,
    pub local: LocalBackendConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteBackendConfig>,
}

/// Replaces the user info of a URL with `***`.
fn redact_url(raw: &str) -> String {
    match reqwest::Url::parse(raw) {
        Ok(mut url) if !url.username().is_empty() || url.password().is_some() => {
            let _ = url.set_username("***");
            let _ = url.set_password(None);
            url.to_string()
        }
        _ => raw.to_string(),
    }
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            backend: SanitizedBackendConfig {
                kind: config.backend.kind,
                local: config.backend.local.clone(),
                remote: config.backend.remote.as_ref().map(|r| RemoteBackendConfig {
                    base_url: redact_url(&r.base_url),
                    timeout_secs: r.timeout_secs,
                }),
            },
            delivery: config.delivery.clone(),
            orchestrator: config.orchestrator.clone(),
            feedback: config.feedback.clone(),
            settings: config.settings.clone(),
        }
    }
}
