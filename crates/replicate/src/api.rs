//! REST client for the Replicate predictions API.
//!
//! [`PredictionBackend`] is the seam the job controller talks through: it
//! returns the raw status code and body of each call and leaves the
//! interpretation (quota, revoked access, payload shape) to the caller.
//! [`ReplicateApi`] is the production implementation using [`reqwest`].

use std::time::Duration;

use async_trait::async_trait;

use crate::messages::PredictionRequest;

/// Public Replicate API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.replicate.com/v1";

/// HTTP timeout for a single create or status call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Status code and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Errors from the Replicate REST layer. Only raised when no HTTP response
/// was obtained; non-2xx statuses come back as a [`RawResponse`].
#[derive(Debug, thiserror::Error)]
pub enum ReplicateApiError {
    /// The request never produced a response (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

impl From<reqwest::Error> for ReplicateApiError {
    fn from(err: reqwest::Error) -> Self {
        ReplicateApiError::Request(err.to_string())
    }
}

/// Transport used by the job controller.
#[async_trait]
pub trait PredictionBackend: Send + Sync {
    /// `POST /predictions` authenticated with `credential`.
    async fn create_prediction(
        &self,
        credential: &str,
        body: &PredictionRequest,
    ) -> Result<RawResponse, ReplicateApiError>;

    /// `GET /predictions/{prediction_id}` authenticated with `credential`.
    async fn get_prediction(
        &self,
        credential: &str,
        prediction_id: &str,
    ) -> Result<RawResponse, ReplicateApiError>;
}

/// HTTP client for the Replicate API.
pub struct ReplicateApi {
    client: reqwest::Client,
    base_url: String,
}

impl ReplicateApi {
    /// Create a client for `base_url` (e.g. [`DEFAULT_BASE_URL`]).
    pub fn new(base_url: impl Into<String>) -> Result<Self, ReplicateApiError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ReplicateApiError::Client(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn predictions_url(&self) -> String {
        format!("{}/predictions", self.base_url)
    }

    fn prediction_url(&self, prediction_id: &str) -> String {
        format!("{}/predictions/{}", self.base_url, prediction_id)
    }

    // ---- private helpers ----

    /// Drain a response into a [`RawResponse`] regardless of status.
    async fn into_raw(response: reqwest::Response) -> Result<RawResponse, ReplicateApiError> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }
}

fn auth_header(credential: &str) -> String {
    format!("Token {credential}")
}

#[async_trait]
impl PredictionBackend for ReplicateApi {
    async fn create_prediction(
        &self,
        credential: &str,
        body: &PredictionRequest,
    ) -> Result<RawResponse, ReplicateApiError> {
        let response = self
            .client
            .post(self.predictions_url())
            .header(reqwest::header::AUTHORIZATION, auth_header(credential))
            .json(body)
            .send()
            .await?;

        Self::into_raw(response).await
    }

    async fn get_prediction(
        &self,
        credential: &str,
        prediction_id: &str,
    ) -> Result<RawResponse, ReplicateApiError> {
        let response = self
            .client
            .get(self.prediction_url(prediction_id))
            .header(reqwest::header::AUTHORIZATION, auth_header(credential))
            .send()
            .await?;

        Self::into_raw(response).await
    }
}
