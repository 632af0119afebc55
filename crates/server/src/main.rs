use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use konverter_core::{
    create_backend, create_feedback, load_config, validate_config, BackendKind,
    ConversionOrchestrator, DeliveryChannel, DiskDelivery, OrchestratorSnapshot,
};
use konverter_server::api::{create_router, WsBroadcaster};
use konverter_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("KONVERTER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Backend: {:?}", config.backend.kind);
    info!("Output directory: {:?}", config.delivery.output_dir);

    // Create the transcoding backend
    let backend = create_backend(&config.backend).context("Failed to create backend")?;
    info!("Using backend: {}", backend.name());

    // Create the delivery channel; remote payloads are fetched from the same service
    let mut disk = DiskDelivery::new(config.delivery.clone());
    if config.backend.kind == BackendKind::Remote {
        if let Some(remote) = &config.backend.remote {
            disk = disk
                .with_remote(remote.base_url.clone())
                .context("Failed to create download client")?;
        }
    }
    let delivery: Arc<dyn DeliveryChannel> = Arc::new(disk);

    // Create feedback service
    let feedback = create_feedback(&config.feedback);
    info!("Using feedback: {}", feedback.name());

    // Create WebSocket broadcaster for real-time updates (before orchestrator so we can pass callback)
    let ws_broadcaster = WsBroadcaster::default();
    let broadcaster_for_callback = ws_broadcaster.clone();

    let orchestrator = ConversionOrchestrator::new(
        config.orchestrator.clone(),
        backend,
        delivery,
        feedback,
    )
    .with_settings(config.settings.clone())
    .with_update_callback(Arc::new(move |snapshot: &OrchestratorSnapshot| {
        broadcaster_for_callback.state_changed(snapshot);
    }));

    // A backend that is not ready keeps the server up; batches are rejected until restart
    if let Err(e) = orchestrator.initialize().await {
        warn!("Conversion backend not ready: {}", e);
    }

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::new(orchestrator),
        ws_broadcaster,
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
