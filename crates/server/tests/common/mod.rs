//! Common test utilities for router-level testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! backed by a mock transcoding backend, a real disk delivery into a temp
//! dir and a recording feedback service.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use konverter_core::{
    testing::{MockBackend, MockFeedback},
    Config, ConversionOrchestrator, DeliveryConfig, DiskDelivery, OrchestratorConfig,
    OrchestratorSnapshot,
};
use konverter_server::api::{create_router, WsBroadcaster};
use konverter_server::state::AppState;

/// Re-export fixtures for test convenience
pub use konverter_core::testing::fixtures;

const BOUNDARY: &str = "konverter-test-boundary";

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_upload() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.upload(&[("a.mp3", "audio/mpeg")]).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock backend - inspect and fail conversions
    pub backend: Arc<MockBackend>,
    /// Mock feedback - observe batch success notifications
    pub feedback: Arc<MockFeedback>,
    /// WebSocket broadcaster the orchestrator publishes to
    pub broadcaster: WsBroadcaster,
    /// Temporary directory holding the delivered files
    pub temp_dir: TempDir,
    /// Delivery output directory
    pub output_dir: PathBuf,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let output_dir = temp_dir.path().join("converted");

        let backend = Arc::new(MockBackend::new());
        backend.set_unavailable(test_config.backend_unavailable).await;
        let feedback = Arc::new(MockFeedback::new());

        let mut config = Config::default();
        config.delivery = DeliveryConfig::new(&output_dir);
        config.orchestrator = OrchestratorConfig::with_reset_delay_ms(test_config.reset_delay_ms);

        let broadcaster = WsBroadcaster::default();
        let broadcaster_for_callback = broadcaster.clone();

        let orchestrator = ConversionOrchestrator::new(
            config.orchestrator.clone(),
            backend.clone(),
            Arc::new(DiskDelivery::new(config.delivery.clone())),
            feedback.clone(),
        )
        .with_update_callback(Arc::new(move |snapshot: &OrchestratorSnapshot| {
            broadcaster_for_callback.state_changed(snapshot);
        }));
        // Readiness is part of what the fixture configures
        let _ = orchestrator.initialize().await;

        let state = Arc::new(AppState::new(
            config,
            Arc::new(orchestrator),
            broadcaster.clone(),
        ));

        Self {
            router: create_router(state),
            backend,
            feedback,
            broadcaster,
            temp_dir,
            output_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Upload `(file name, content type)` pairs to the queue as `file` fields.
    pub async fn upload(&self, files: &[(&str, &str)]) -> TestResponse {
        let mut body = Vec::new();
        for (name, content_type) in files {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                    BOUNDARY, name, content_type
                )
                .as_bytes(),
            );
            body.extend_from_slice(fixtures::WAV_HEADER);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/queue")
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();

        self.send(request).await
    }

    /// Send a GET request and return the raw body bytes.
    pub async fn get_bytes(&self, path: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, bytes.to_vec())
    }

    /// Poll `/api/v1/status` until the batch reaches `state`.
    pub async fn wait_for_state(&self, state: &str, timeout: Duration) -> Option<Value> {
        let start = std::time::Instant::now();
        while start.elapsed() < timeout {
            let response = self.get("/api/v1/status").await;
            if response.body["state"] == state {
                return Some(response.body);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        None
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Delay before a completed batch resets
    pub reset_delay_ms: u64,
    /// Make the backend fail its readiness check
    pub backend_unavailable: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            reset_delay_ms: 10_000,
            backend_unavailable: false,
        }
    }
}

impl TestConfig {
    /// Create config with a short auto-reset.
    pub fn with_reset_delay_ms(reset_delay_ms: u64) -> Self {
        Self {
            reset_delay_ms,
            ..Default::default()
        }
    }

    /// Create config with a backend that is not ready.
    pub fn with_unavailable_backend() -> Self {
        Self {
            backend_unavailable: true,
            ..Default::default()
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
