//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock collaborators injected, so whole jobs run through the HTTP API
//! without ffmpeg, yt-dlp or network access.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use talkreel_core::{
    config::MediaConfig, testing::fixtures::MockPipeline, Config, InMemoryJobStore, JobStore,
    PipelineOrchestrator,
};
use talkreel_server::state::AppState;

/// Re-export fixtures for test convenience
pub use talkreel_core::testing::fixtures;

/// Test fixture for API testing with mock collaborators.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_job_submission() {
///     let fixture = TestFixture::new();
///
///     let response = fixture.post("/api/v1/jobs", json!({
///         "audio_url": "https://example.com/talk.mp3",
///         "title": "Talk 1"
///     })).await;
///
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock collaborators - configure failures and delays
    pub mocks: MockPipeline,
    /// The store behind the orchestrator
    pub store: Arc<InMemoryJobStore>,
    /// Media root; mocks write their artifacts here
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Response with the raw body, for file downloads
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl TestFixture {
    /// Create a new test fixture with default config.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a test fixture from `config`; the media root is replaced by a
    /// temporary directory.
    pub fn with_config(mut config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        config.media = MediaConfig {
            root_dir: temp_dir.path().to_path_buf(),
        };

        let mocks = MockPipeline::with_output_dir(temp_dir.path());
        let store = Arc::new(InMemoryJobStore::new());
        let orchestrator = Arc::new(PipelineOrchestrator::new(
            config.orchestrator.clone(),
            Arc::clone(&store) as Arc<dyn JobStore>,
            mocks.services(),
        ));

        let state = Arc::new(AppState::new(config, orchestrator));
        let router = talkreel_server::api::create_router(state);

        Self {
            router,
            mocks,
            store,
            temp_dir,
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

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let raw = self.send(request).await;
        TestResponse {
            status: raw.status,
            body: parse_json(&raw.bytes),
        }
    }

    /// Send a GET request and keep the body as bytes.
    pub async fn get_raw(&self, path: &str) -> RawResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Submit a job and return its id.
    pub async fn submit(&self, body: Value) -> String {
        let response = self.post("/api/v1/jobs", body).await;
        assert_eq!(response.status, StatusCode::ACCEPTED, "{:?}", response.body);
        response.body["job_id"]
            .as_str()
            .expect("job_id missing")
            .to_string()
    }

    /// Wait for a job to reach a terminal state, then return its API view.
    pub async fn wait_for_job(&self, job_id: &str) -> Value {
        fixtures::wait_for_terminal(self.store.as_ref(), job_id, Duration::from_secs(5))
            .await
            .expect("job did not finish in time");
        let response = self.get(&format!("/api/v1/jobs/{}", job_id)).await;
        assert_eq!(response.status, StatusCode::OK);
        response.body
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

        let request = request_builder.body(body).unwrap();
        let raw = self.send(request).await;
        TestResponse {
            status: raw.status,
            body: parse_json(&raw.bytes),
        }
    }

    async fn send(&self, request: Request<Body>) -> RawResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        RawResponse {
            status,
            content_type,
            bytes,
        }
    }
}

fn parse_json(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(bytes).unwrap_or(Value::Null)
    }
}
