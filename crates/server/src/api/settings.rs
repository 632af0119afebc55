//! Settings API handlers.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use konverter_core::{OutputFormat, Settings};

use super::handlers::{error_response, ApiError};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub settings: Settings,
    pub output_format: OutputFormat,
}

impl From<Settings> for SettingsResponse {
    fn from(settings: Settings) -> Self {
        Self {
            output_format: settings.output_format(),
            settings,
        }
    }
}

pub async fn get_settings(State(state): State<Arc<AppState>>) -> Json<SettingsResponse> {
    Json(state.orchestrator().settings().await.into())
}

/// Replace the settings used by the next batch.
///
/// Unknown codecs fall back to MP3; missing fields take their defaults.
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<Settings>,
) -> Result<Json<SettingsResponse>, ApiError> {
    state
        .orchestrator()
        .set_settings(settings)
        .await
        .map(|s| Json(s.into()))
        .map_err(error_response)
}
