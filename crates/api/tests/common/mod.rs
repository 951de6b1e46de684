#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use secrecy::SecretString;
use tower::ServiceExt;

use convertx_api::app::build_app;
use convertx_api::config::ServerConfig;
use convertx_api::state::AppState;
use convertx_core::history::HistoryLog;
use convertx_core::store::MemoryStore;
use convertx_replicate::api::{PredictionBackend, RawResponse, ReplicateApiError};
use convertx_replicate::messages::PredictionRequest;
use convertx_replicate::{CredentialPool, GenerationJobController};

/// Scripted prediction backend. Replies are popped in order; running out
/// of replies is a test bug and panics.
#[derive(Default)]
pub struct MockBackend {
    create_replies: Mutex<VecDeque<RawResponse>>,
    status_replies: Mutex<VecDeque<RawResponse>>,
    prompts: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn push_create(&self, status: u16, body: &str) -> &Self {
        self.create_replies
            .lock()
            .unwrap()
            .push_back(RawResponse::new(status, body));
        self
    }

    pub fn push_status(&self, status: u16, body: &str) -> &Self {
        self.status_replies
            .lock()
            .unwrap()
            .push_back(RawResponse::new(status, body));
        self
    }

    /// Prompts sent to the create endpoint, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl PredictionBackend for MockBackend {
    async fn create_prediction(
        &self,
        _credential: &str,
        body: &PredictionRequest,
    ) -> Result<RawResponse, ReplicateApiError> {
        self.prompts.lock().unwrap().push(body.input.prompt.clone());
        Ok(self
            .create_replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected create call"))
    }

    async fn get_prediction(
        &self,
        _credential: &str,
        _prediction_id: &str,
    ) -> Result<RawResponse, ReplicateApiError> {
        Ok(self
            .status_replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected status call"))
    }
}

pub const PROCESSING: &str = r#"{"status":"processing"}"#;

pub fn created(id: &str) -> String {
    format!(r#"{{"id":"{id}","status":"starting"}}"#)
}

pub fn succeeded(url: &str) -> String {
    format!(r#"{{"status":"succeeded","output":["{url}"]}}"#)
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 150,
        replicate_tokens: vec![SecretString::from("r8_a"), SecretString::from("r8_b")],
        replicate_base_url: "http://127.0.0.1:9".to_string(),
        history_path: None,
    }
}

/// Everything a test needs to drive and inspect the app.
pub struct TestApp {
    pub state: AppState,
    pub backend: Arc<MockBackend>,
}

impl TestApp {
    pub fn new() -> Self {
        let config = test_config();
        let backend = Arc::new(MockBackend::default());
        let credentials = Arc::new(
            CredentialPool::new(config.replicate_tokens.clone()).expect("test tokens"),
        );
        let history = HistoryLog::new(Arc::new(MemoryStore::new()));
        let generator = GenerationJobController::new(backend.clone(), credentials)
            .with_history(history.clone());

        Self {
            state: AppState::new(config, generator, history),
            backend,
        }
    }

    /// Full router with the production middleware stack.
    pub fn router(&self) -> Router {
        build_app(self.state.clone()).expect("test app builds")
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    user_email: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(email) = user_email {
        builder = builder.header("x-user-email", email);
    }
    app.oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
