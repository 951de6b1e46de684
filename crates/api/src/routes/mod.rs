pub mod health;
pub mod history;
pub mod images;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /images/generate                 generate one image (POST)
/// /images/templates                prompt templates and presets (GET)
/// /images/templates/{key}          one prompt template (GET)
///
/// /history/{email}                 user's tool history (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/images", images::router())
        .nest("/history", history::router())
}
