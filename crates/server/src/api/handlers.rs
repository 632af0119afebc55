use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use konverter_core::{Codec, OrchestratorError, OrchestratorSnapshot, SanitizedConfig, Severity};

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub backend: String,
    pub backend_ready: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub severity: Severity,
}

/// Status code and body returned for a failed request.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Maps an orchestrator error to a status code and JSON body.
pub fn error_response(err: OrchestratorError) -> ApiError {
    let status = match &err {
        OrchestratorError::InvalidSelection { .. } | OrchestratorError::InvalidSettings { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        OrchestratorError::BackendUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        OrchestratorError::AlreadyRunning
        | OrchestratorError::SettingsLocked
        | OrchestratorError::QueueLocked => StatusCode::CONFLICT,
        OrchestratorError::InvalidIndex { .. } => StatusCode::NOT_FOUND,
        OrchestratorError::TranscodeFailure { .. } | OrchestratorError::DeliveryFailure { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (
        status,
        Json(ErrorResponse {
            severity: err.severity(),
            error: err.to_string(),
        }),
    )
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let orchestrator = state.orchestrator();
    Json(HealthResponse {
        status: "ok".to_string(),
        backend: orchestrator.backend_name().to_string(),
        backend_ready: orchestrator.is_backend_ready().await,
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// Current published orchestrator state.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<OrchestratorSnapshot> {
    Json(state.orchestrator().snapshot().await)
}

/// One row of the output format table.
#[derive(Debug, Serialize)]
pub struct FormatResponse {
    pub codec: &'static str,
    pub format: &'static str,
    pub codec_name: &'static str,
    pub extension: &'static str,
    pub mime: &'static str,
}

pub async fn list_formats() -> Json<Vec<FormatResponse>> {
    Json(
        Codec::all()
            .into_iter()
            .map(|codec| {
                let format = codec.output_format();
                FormatResponse {
                    codec: codec.id(),
                    format: format.format,
                    codec_name: format.codec_name,
                    extension: format.extension,
                    mime: format.mime,
                }
            })
            .collect(),
    )
}

/// Prometheus text exposition.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state).await;
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
