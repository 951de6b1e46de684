//! Handlers for image generation and the prompt template catalog.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use convertx_core::error::CoreError;
use convertx_core::generation::{GenerationRequest, InferenceSteps, StylePreset};
use convertx_core::templates::{find_template, PromptTemplate, PROMPT_TEMPLATES, SAMPLE_PROMPTS};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Header carrying the signed-in user's email, used to key history.
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// Body of `POST /api/v1/images/generate`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageRequest {
    pub prompt: String,
    #[serde(default)]
    pub negative_prompt: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// Inference step count: 20, 30 or 50.
    #[serde(default)]
    pub steps: Option<u32>,
    #[serde(default)]
    pub guidance: Option<f64>,
    /// Style tag such as `photographic`, or `none`.
    #[serde(default)]
    pub style: Option<String>,
}

impl GenerateImageRequest {
    /// Convert into a domain request, applying defaults for omitted fields.
    pub fn into_generation(self) -> Result<GenerationRequest, CoreError> {
        let mut request = GenerationRequest::new(self.prompt);

        if let Some(negative) = self.negative_prompt {
            request = request.with_negative_prompt(negative);
        }
        if self.width.is_some() || self.height.is_some() {
            let width = self.width.unwrap_or(request.width());
            let height = self.height.unwrap_or(request.height());
            request = request.with_dimensions(width, height);
        }
        if let Some(steps) = self.steps {
            request = request.with_steps(InferenceSteps::from_count(steps)?);
        }
        if let Some(guidance) = self.guidance {
            request = request.with_guidance_scale(guidance);
        }
        if let Some(style) = self.style.as_deref() {
            request = request.with_style(StylePreset::parse(style)?);
        }

        request.validate()?;
        Ok(request)
    }
}

/// Result of a finished generation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageResponse {
    pub job_id: String,
    pub status: &'static str,
    pub image_url: String,
    /// Status checks it took to finish.
    pub attempts: u32,
}

/// Everything the generator UI offers as a starting point.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateCatalog {
    pub templates: &'static [PromptTemplate],
    pub sample_prompts: &'static [&'static str],
    pub styles: Vec<&'static str>,
    pub steps: Vec<u32>,
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// POST /api/v1/images/generate
///
/// Create a prediction and hold the request open until it finishes, the
/// poll budget runs out, or the server shuts down.
pub async fn generate_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<GenerateImageRequest>,
) -> AppResult<impl IntoResponse> {
    let request = input.into_generation()?;
    let user = user_email(&headers);
    let cancel = state.shutdown.child_token();

    let job = state
        .generator
        .generate(
            &request,
            user.as_deref(),
            |progress| tracing::trace!(progress, "Generation progress"),
            &cancel,
        )
        .await?;

    let (Some(job_id), Some(image_url)) = (job.id, job.result_url) else {
        return Err(AppError::InternalError(
            "Finished job is missing its id or result".to_string(),
        ));
    };

    tracing::info!(job_id = %job_id, attempts = job.attempt, "Image generated");

    Ok(Json(DataResponse {
        data: GenerateImageResponse {
            job_id,
            status: "succeeded",
            image_url,
            attempts: job.attempt,
        },
    }))
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// GET /api/v1/images/templates
pub async fn list_templates() -> AppResult<impl IntoResponse> {
    Ok(Json(DataResponse {
        data: TemplateCatalog {
            templates: PROMPT_TEMPLATES,
            sample_prompts: SAMPLE_PROMPTS,
            styles: StylePreset::ALL.iter().map(|s| s.as_str()).collect(),
            steps: [
                InferenceSteps::Fast,
                InferenceSteps::Balanced,
                InferenceSteps::HighQuality,
            ]
            .iter()
            .map(|s| s.count())
            .collect(),
        },
    }))
}

/// GET /api/v1/images/templates/{key}
pub async fn get_template(Path(key): Path<String>) -> AppResult<impl IntoResponse> {
    let template = find_template(&key)
        .ok_or_else(|| AppError::NotFound(format!("Prompt template '{key}' not found")))?;
    Ok(Json(DataResponse { data: template }))
}

// ---- private helpers ----

fn user_email(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_EMAIL_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
