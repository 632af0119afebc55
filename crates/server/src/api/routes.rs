use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

use super::{batch, handlers, middleware::metrics_middleware, queue, settings, ws};
use crate::state::AppState;

/// Largest accepted request body, uploads included.
const MAX_UPLOAD_BYTES: usize = 1024 * 1024 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let downloads = ServeDir::new(state.downloads_dir());

    // API routes
    let api_routes = Router::new()
        // Health, config and state
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/status", get(handlers::get_status))
        .route("/formats", get(handlers::list_formats))
        // Queue
        .route(
            "/queue",
            get(queue::list_queue)
                .post(queue::add_files)
                .delete(queue::clear_queue),
        )
        .route("/queue/{index}", delete(queue::remove_file))
        // Settings
        .route(
            "/settings",
            get(settings::get_settings).put(settings::update_settings),
        )
        // Batch
        .route("/batch/start", post(batch::start_batch))
        .route("/batch/retry", post(batch::retry_batch))
        // Real-time updates
        .route("/ws", get(ws::ws_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .nest_service("/downloads", downloads)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
