//! Route definitions for image generation.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::images;
use crate::state::AppState;

/// Routes mounted at `/images`.
///
/// ```text
/// POST /generate         -> generate_image
/// GET  /templates        -> list_templates
/// GET  /templates/{key}  -> get_template
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate", post(images::generate_image))
        .route("/templates", get(images::list_templates))
        .route("/templates/{key}", get(images::get_template))
}
