//! Quick-start prompt templates and sample prompts for the image generator.

use serde::Serialize;

/// A named, ready-to-use prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PromptTemplate {
    pub key: &'static str,
    pub prompt: &'static str,
}

pub const PROMPT_TEMPLATES: &[PromptTemplate] = &[
    PromptTemplate {
        key: "portrait",
        prompt: "A professional headshot of a person, studio lighting, high-end photography, detailed facial features, DSLR, 85mm lens, bokeh background",
    },
    PromptTemplate {
        key: "landscape",
        prompt: "A breathtaking mountain landscape at sunset, dramatic lighting, golden hour, volumetric clouds, ultra-detailed, 8k resolution, wide-angle lens",
    },
    PromptTemplate {
        key: "concept",
        prompt: "A futuristic cyberpunk city, neon lights, rain-slicked streets, towering skyscrapers, detailed architecture, moody atmosphere, cinematic lighting",
    },
    PromptTemplate {
        key: "product",
        prompt: "A minimalist product photo, clean white background, professional studio lighting, high-end commercial photography, product centered, sharp details",
    },
    PromptTemplate {
        key: "fantasy",
        prompt: "A mystical wizard character, intricate magical robes, glowing magical effects, detailed fantasy environment, dramatic lighting, high detail",
    },
    PromptTemplate {
        key: "abstract",
        prompt: "An abstract composition of flowing shapes and colors, vibrant color palette, dynamic movement, artistic expression, high resolution artwork",
    },
];

/// Free-form prompts shown as inspiration.
pub const SAMPLE_PROMPTS: &[&str] = &[
    "A serene lake surrounded by mountains at sunset, photorealistic",
    "Futuristic cityscape with flying cars and neon lights, digital art",
    "Portrait of a fantasy character with intricate armor, highly detailed",
    "Abstract geometric patterns in vibrant colors, minimalist style",
    "Underwater scene with coral reef and tropical fish, nature photography",
];

/// Look up a template by key.
pub fn find_template(key: &str) -> Option<&'static PromptTemplate> {
    PROMPT_TEMPLATES.iter().find(|t| t.key == key)
}
