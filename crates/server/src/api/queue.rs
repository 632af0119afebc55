//! Queue API handlers.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use konverter_core::{FileRef, QueuedFileSummary, Severity};

use super::handlers::{error_response, ApiError, ErrorResponse};
use crate::state::AppState;

/// Name used for uploads without a filename.
const UNNAMED_UPLOAD: &str = "upload";

/// Response for adding files to the queue
#[derive(Debug, Serialize)]
pub struct AddFilesResponse {
    pub accepted: usize,
    pub rejected: usize,
    pub total: usize,
    pub files: Vec<QueuedFileSummary>,
}

fn bad_request(error: String) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error,
            severity: Severity::Warning,
        }),
    )
}

/// List the queue
pub async fn list_queue(State(state): State<Arc<AppState>>) -> Json<Vec<QueuedFileSummary>> {
    Json(state.orchestrator().snapshot().await.files)
}

/// Add the uploaded `file` fields to the queue
pub async fn add_files(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<AddFilesResponse>, ApiError> {
    let mut files = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(bad_request(format!("Invalid multipart body: {}", e))),
        };

        if field.name() != Some("file") {
            continue;
        }

        let name = field
            .file_name()
            .filter(|n| !n.is_empty())
            .unwrap_or(UNNAMED_UPLOAD)
            .to_string();
        let media_type = field.content_type().map(|m| m.to_string());
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return Err(bad_request(format!("Failed to read file: {}", e))),
        };

        debug!(file = %name, media_type = ?media_type, size = bytes.len(), "Received upload");
        files.push(FileRef::from_bytes(name, media_type, bytes.to_vec()));
    }

    let outcome = state
        .orchestrator()
        .add(files)
        .await
        .map_err(error_response)?;

    Ok(Json(AddFilesResponse {
        accepted: outcome.accepted,
        rejected: outcome.rejected,
        total: outcome.total,
        files: state.orchestrator().snapshot().await.files,
    }))
}

/// Remove the entry at `index`
pub async fn remove_file(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<Json<QueuedFileSummary>, ApiError> {
    state
        .orchestrator()
        .remove(index)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Empty the queue
pub async fn clear_queue(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.orchestrator().reset_queue().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e).into_response(),
    }
}
