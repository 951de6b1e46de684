use std::sync::Arc;

use convertx_core::history::HistoryLog;
use convertx_core::store::{JsonFileStore, KeyValueStore, MemoryStore};
use convertx_replicate::{CredentialPool, GenerationJobController, ReplicateApi};
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::error::StartupError;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Generation controller owning the credential pool.
    pub generator: Arc<GenerationJobController>,
    /// Per-user generation history.
    pub history: HistoryLog,
    /// Cancelled on shutdown; every in-flight generation polls under a
    /// child of this token.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        generator: GenerationJobController,
        history: HistoryLog,
    ) -> Self {
        Self {
            config: Arc::new(config),
            generator: Arc::new(generator),
            history,
            shutdown: CancellationToken::new(),
        }
    }

    /// Wire the production Replicate client, credential pool, and history
    /// store described by `config`.
    pub fn from_config(config: ServerConfig) -> Result<Self, StartupError> {
        let backend = ReplicateApi::new(config.replicate_base_url.clone())?;
        let credentials = CredentialPool::new(config.replicate_tokens.clone())?;

        let store: Arc<dyn KeyValueStore> = match &config.history_path {
            Some(path) => {
                tracing::info!(path = %path.display(), "Using file-backed history");
                Arc::new(JsonFileStore::open(path.clone()))
            }
            None => {
                tracing::info!("Using in-memory history");
                Arc::new(MemoryStore::new())
            }
        };
        let history = HistoryLog::new(store);

        tracing::info!(
            credentials = credentials.len(),
            base_url = %backend.base_url(),
            "Replicate client configured",
        );

        let generator = GenerationJobController::new(Arc::new(backend), Arc::new(credentials))
            .with_history(history.clone());

        Ok(Self::new(config, generator, history))
    }
}
