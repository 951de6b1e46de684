//! Image generation request model, presets, and validation.
//!
//! A [`GenerationRequest`] is built once per user-initiated generation and
//! never modified afterwards. The `with_*` builders consume and return the
//! value, so a request handed to the controller is effectively frozen.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Defaults and bounds
// ---------------------------------------------------------------------------

/// Default output width in pixels.
pub const DEFAULT_WIDTH: u32 = 1024;
/// Default output height in pixels.
pub const DEFAULT_HEIGHT: u32 = 1024;
/// Smallest accepted edge length in pixels.
pub const MIN_DIMENSION: u32 = 64;
/// Largest accepted edge length in pixels.
pub const MAX_DIMENSION: u32 = 2048;
/// Default classifier-free guidance scale.
pub const DEFAULT_GUIDANCE_SCALE: f64 = 7.5;
/// Upper bound on the guidance scale.
pub const MAX_GUIDANCE_SCALE: f64 = 50.0;

/// Sentinel accepted by [`StylePreset::parse`] meaning "no style".
pub const STYLE_NONE: &str = "none";

// ---------------------------------------------------------------------------
// Style presets
// ---------------------------------------------------------------------------

/// Style suffix appended to the prompt before submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StylePreset {
    Photographic,
    DigitalArt,
    FantasyArt,
    OilPainting,
    Watercolor,
    Render3d,
}

impl StylePreset {
    /// Every preset, in menu order.
    pub const ALL: [StylePreset; 6] = [
        StylePreset::Photographic,
        StylePreset::DigitalArt,
        StylePreset::FantasyArt,
        StylePreset::OilPainting,
        StylePreset::Watercolor,
        StylePreset::Render3d,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StylePreset::Photographic => "photographic",
            StylePreset::DigitalArt => "digital-art",
            StylePreset::FantasyArt => "fantasy-art",
            StylePreset::OilPainting => "oil-painting",
            StylePreset::Watercolor => "watercolor",
            StylePreset::Render3d => "3d-render",
        }
    }

    /// Parse a style tag. `"none"` and the empty string map to `None`.
    pub fn parse(tag: &str) -> Result<Option<StylePreset>, CoreError> {
        let tag = tag.trim();
        if tag.is_empty() || tag == STYLE_NONE {
            return Ok(None);
        }
        Self::ALL
            .into_iter()
            .find(|preset| preset.as_str() == tag)
            .map(Some)
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|p| p.as_str()).collect();
                CoreError::Validation(format!(
                    "Invalid style '{tag}'. Must be one of: {STYLE_NONE}, {}",
                    valid.join(", ")
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Inference steps
// ---------------------------------------------------------------------------

/// The enumerated set of denoising step counts offered to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InferenceSteps {
    /// 20 steps.
    Fast,
    /// 30 steps.
    Balanced,
    /// 50 steps.
    #[default]
    HighQuality,
}

impl InferenceSteps {
    pub fn count(self) -> u32 {
        match self {
            InferenceSteps::Fast => 20,
            InferenceSteps::Balanced => 30,
            InferenceSteps::HighQuality => 50,
        }
    }

    /// Map a raw step count onto the enumerated set.
    pub fn from_count(count: u32) -> Result<Self, CoreError> {
        match count {
            20 => Ok(InferenceSteps::Fast),
            30 => Ok(InferenceSteps::Balanced),
            50 => Ok(InferenceSteps::HighQuality),
            other => Err(CoreError::Validation(format!(
                "Invalid step count {other}. Must be one of: 20, 30, 50"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// One user-initiated image generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    prompt: String,
    negative_prompt: String,
    width: u32,
    height: u32,
    style: Option<StylePreset>,
    steps: InferenceSteps,
    guidance_scale: f64,
}

impl GenerationRequest {
    /// Create a request with default dimensions, steps, and guidance.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: String::new(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            style: None,
            steps: InferenceSteps::default(),
            guidance_scale: DEFAULT_GUIDANCE_SCALE,
        }
    }

    pub fn with_negative_prompt(mut self, negative_prompt: impl Into<String>) -> Self {
        self.negative_prompt = negative_prompt.into();
        self
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_style(mut self, style: Option<StylePreset>) -> Self {
        self.style = style;
        self
    }

    pub fn with_steps(mut self, steps: InferenceSteps) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_guidance_scale(mut self, guidance_scale: f64) -> Self {
        self.guidance_scale = guidance_scale;
        self
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn negative_prompt(&self) -> &str {
        &self.negative_prompt
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn style(&self) -> Option<StylePreset> {
        self.style
    }

    pub fn steps(&self) -> InferenceSteps {
        self.steps
    }

    pub fn guidance_scale(&self) -> f64 {
        self.guidance_scale
    }

    /// The prompt actually sent to the model: the user prompt with the
    /// style tag appended as `", <style> style"` when one is selected.
    pub fn styled_prompt(&self) -> String {
        match self.style {
            Some(style) => format!("{}, {} style", self.prompt, style.as_str()),
            None => self.prompt.clone(),
        }
    }

    /// Check every field against its bounds.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_prompt(&self.prompt)?;
        validate_dimension("width", self.width)?;
        validate_dimension("height", self.height)?;
        validate_guidance_scale(self.guidance_scale)
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

/// Reject prompts that are empty or whitespace only.
pub fn validate_prompt(prompt: &str) -> Result<(), CoreError> {
    if prompt.trim().is_empty() {
        return Err(CoreError::Validation("Prompt must not be empty".to_string()));
    }
    Ok(())
}

/// Validate that an edge length is within [`MIN_DIMENSION`]..=[`MAX_DIMENSION`].
pub fn validate_dimension(field: &str, value: u32) -> Result<(), CoreError> {
    if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&value) {
        return Err(CoreError::Validation(format!(
            "{field} must be between {MIN_DIMENSION} and {MAX_DIMENSION}, got {value}"
        )));
    }
    Ok(())
}

/// Validate that a guidance scale is finite, positive, and at most
/// [`MAX_GUIDANCE_SCALE`].
pub fn validate_guidance_scale(value: f64) -> Result<(), CoreError> {
    if !value.is_finite() || value <= 0.0 || value > MAX_GUIDANCE_SCALE {
        return Err(CoreError::Validation(format!(
            "Guidance scale must be in (0, {MAX_GUIDANCE_SCALE}], got {value}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
