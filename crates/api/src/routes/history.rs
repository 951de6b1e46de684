use axum::routing::get;
use axum::Router;

use crate::handlers::history;
use crate::state::AppState;

/// Routes mounted at `/history`.
///
/// ```text
/// GET /{email} -> list_history
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{email}", get(history::list_history))
}
