//! Batch API handlers.
//!
//! Batches run in the background; their progress and outcome are published
//! through the orchestrator state (`GET /status`, `/ws`).

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use konverter_core::PreparedBatch;

use super::handlers::{error_response, ApiError};
use crate::state::AppState;

/// Response for an accepted batch
#[derive(Debug, Serialize)]
pub struct BatchStartedResponse {
    pub message: String,
    pub files: usize,
}

/// Runs `batch` in the background and answers 202.
fn spawn_batch(
    state: &AppState,
    batch: PreparedBatch,
    message: &str,
) -> (StatusCode, Json<BatchStartedResponse>) {
    let files = batch.len();
    let orchestrator = Arc::clone(state.orchestrator());
    tokio::spawn(async move {
        // Failures are already published as the orchestrator state.
        if let Err(e) = orchestrator.run(batch).await {
            debug!(error = %e, "Background batch ended with an error");
        }
    });

    info!(files, "{}", message);
    (
        StatusCode::ACCEPTED,
        Json(BatchStartedResponse {
            message: message.to_string(),
            files,
        }),
    )
}

/// Start converting the whole queue
pub async fn start_batch(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<BatchStartedResponse>), ApiError> {
    let batch = state.orchestrator().prepare().await.map_err(error_response)?;
    Ok(spawn_batch(&state, batch, "Conversion started"))
}

/// Clear the failure and convert the whole queue again
pub async fn retry_batch(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<BatchStartedResponse>), ApiError> {
    let batch = state
        .orchestrator()
        .prepare_retry()
        .await
        .map_err(error_response)?;
    Ok(spawn_batch(&state, batch, "Conversion restarted"))
}
