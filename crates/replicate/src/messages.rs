//! Replicate `/predictions` request and response types.
//!
//! Outgoing bodies are built from a [`GenerationRequest`]; incoming bodies
//! are decoded into typed structs so an unknown `status` value surfaces as
//! a parse error instead of an endless poll.

use convertx_core::generation::GenerationRequest;
use serde::{Deserialize, Serialize};

/// Pinned SDXL model version used for every prediction.
pub const MODEL_VERSION: &str = "39ed52f2a78e934b3ba6e2a89f5b1c712de7dfea535525255b1aa35c5565e08b";
/// Sampler passed to the model.
pub const SCHEDULER: &str = "K_EULER";
/// Refiner setting passed to the model.
pub const REFINE: &str = "no_refiner";
/// Images requested per prediction.
pub const NUM_OUTPUTS: u32 = 1;

/// Body of `POST /predictions`.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRequest {
    pub version: &'static str,
    pub input: PredictionInput,
}

/// Model input parameters.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionInput {
    pub prompt: String,
    pub negative_prompt: String,
    pub width: u32,
    pub height: u32,
    pub num_outputs: u32,
    pub scheduler: &'static str,
    pub num_inference_steps: u32,
    pub guidance_scale: f64,
    pub refine: &'static str,
}

impl PredictionRequest {
    /// Build the wire body for a generation request. The style preset is
    /// folded into the prompt text.
    pub fn from_generation(request: &GenerationRequest) -> Self {
        Self {
            version: MODEL_VERSION,
            input: PredictionInput {
                prompt: request.styled_prompt(),
                negative_prompt: request.negative_prompt().to_string(),
                width: request.width(),
                height: request.height(),
                num_outputs: NUM_OUTPUTS,
                scheduler: SCHEDULER,
                num_inference_steps: request.steps().count(),
                guidance_scale: request.guidance_scale(),
                refine: REFINE,
            },
        }
    }
}

/// Lifecycle status reported by Replicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}


/// Response to `POST /predictions`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePredictionResponse {
    /// Server-assigned prediction id.
    pub id: String,
    pub status: Option<PredictionStatus>,
}

/// Response to `GET /predictions/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionStatusResponse {
    pub status: PredictionStatus,
    /// Output URLs; `null` until the prediction succeeds.
    #[serde(default)]
    pub output: Option<Vec<String>>,
    /// Failure description. Usually a string, occasionally structured.
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl PredictionStatusResponse {
    /// First output URL, if any.
    pub fn first_output(&self) -> Option<&str> {
        self.output.as_ref()?.first().map(String::as_str)
    }

    /// Human-readable failure detail, if the remote supplied one.
    pub fn error_message(&self) -> Option<String> {
        match self.error.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.trim().is_empty() => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

pub fn parse_create_response(text: &str) -> Result<CreatePredictionResponse, serde_json::Error> {
    serde_json::from_str(text)
}

pub fn parse_status_response(text: &str) -> Result<PredictionStatusResponse, serde_json::Error> {
    serde_json::from_str(text)
}
