#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use convertx_core::history::HistoryLog;
use convertx_core::store::MemoryStore;
use convertx_replicate::api::{PredictionBackend, RawResponse, ReplicateApiError};
use convertx_replicate::messages::PredictionRequest;
use convertx_replicate::{CredentialPool, GenerationJobController};

type Reply = Result<RawResponse, ReplicateApiError>;

/// One recorded call against the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create { credential: String, prompt: String },
    Status { credential: String, id: String },
}

/// Scripted prediction backend.
///
/// Replies are popped from FIFO queues. When the status queue is empty the
/// `fallback_status` reply is returned (if set); an empty create queue or
/// missing fallback panics so a test never silently over-calls.
#[derive(Default)]
pub struct MockBackend {
    create_replies: Mutex<VecDeque<Reply>>,
    status_replies: Mutex<VecDeque<Reply>>,
    fallback_status: Mutex<Option<RawResponse>>,
    calls: Mutex<Vec<Call>>,
    status_times: Mutex<Vec<tokio::time::Instant>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_create(&self, status: u16, body: &str) -> &Self {
        self.create_replies
            .lock()
            .unwrap()
            .push_back(Ok(RawResponse::new(status, body)));
        self
    }

    pub fn push_create_network_error(&self) -> &Self {
        self.create_replies
            .lock()
            .unwrap()
            .push_back(Err(ReplicateApiError::Request("connection refused".into())));
        self
    }

    pub fn push_status(&self, status: u16, body: &str) -> &Self {
        self.status_replies
            .lock()
            .unwrap()
            .push_back(Ok(RawResponse::new(status, body)));
        self
    }

    pub fn push_status_network_error(&self) -> &Self {
        self.status_replies
            .lock()
            .unwrap()
            .push_back(Err(ReplicateApiError::Request("connection reset".into())));
        self
    }

    pub fn push_processing(&self, times: usize) -> &Self {
        for _ in 0..times {
            self.push_status(200, PROCESSING);
        }
        self
    }

    pub fn always_status(&self, status: u16, body: &str) -> &Self {
        *self.fallback_status.lock().unwrap() = Some(RawResponse::new(status, body));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn create_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Create { .. }))
            .count()
    }

    pub fn status_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Status { .. }))
            .count()
    }

    pub fn create_credentials(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create { credential, .. } => Some(credential),
                Call::Status { .. } => None,
            })
            .collect()
    }

    pub fn status_times(&self) -> Vec<tokio::time::Instant> {
        self.status_times.lock().unwrap().clone()
    }
}

#[async_trait]
impl PredictionBackend for MockBackend {
    async fn create_prediction(&self, credential: &str, body: &PredictionRequest) -> Reply {
        self.calls.lock().unwrap().push(Call::Create {
            credential: credential.to_string(),
            prompt: body.input.prompt.clone(),
        });
        self.create_replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected create call")
    }

    async fn get_prediction(&self, credential: &str, prediction_id: &str) -> Reply {
        self.calls.lock().unwrap().push(Call::Status {
            credential: credential.to_string(),
            id: prediction_id.to_string(),
        });
        self.status_times
            .lock()
            .unwrap()
            .push(tokio::time::Instant::now());

        if let Some(reply) = self.status_replies.lock().unwrap().pop_front() {
            return reply;
        }
        let fallback = self.fallback_status.lock().unwrap().clone();
        Ok(fallback.expect("unexpected status call"))
    }
}

pub const PROCESSING: &str = r#"{"status":"processing","output":null}"#;
pub const STARTING: &str = r#"{"status":"starting"}"#;

pub fn created(id: &str) -> String {
    format!(r#"{{"id":"{id}","status":"starting"}}"#)
}

pub fn succeeded(url: &str) -> String {
    format!(r#"{{"status":"succeeded","output":["{url}"]}}"#)
}

pub fn pool(tokens: &[&str]) -> Arc<CredentialPool> {
    Arc::new(CredentialPool::from_tokens(tokens.iter().copied()).unwrap())
}

/// Controller over a fresh mock and an in-memory history log.
pub fn controller(
    tokens: &[&str],
) -> (GenerationJobController, Arc<MockBackend>, HistoryLog) {
    let backend = Arc::new(MockBackend::new());
    let history = HistoryLog::new(Arc::new(MemoryStore::new()));
    let controller = GenerationJobController::new(backend.clone(), pool(tokens))
        .with_history(history.clone());
    (controller, backend, history)
}
