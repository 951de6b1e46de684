use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/history/{email}
///
/// List a user's tool history, most recent first. Unknown users get an
/// empty list.
pub async fn list_history(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> AppResult<impl IntoResponse> {
    let email = email.trim().to_string();
    if email.is_empty() {
        return Err(AppError::BadRequest("Email must not be empty".to_string()));
    }

    // The file-backed store reads from disk.
    let history = state.history.clone();
    let entries = tokio::task::spawn_blocking(move || history.list(&email))
        .await
        .map_err(|e| AppError::InternalError(format!("History task failed: {e}")))??;

    Ok(Json(DataResponse { data: entries }))
}
