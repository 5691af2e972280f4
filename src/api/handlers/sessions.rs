//! Active session listing.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::SessionListResponse;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, PresenceError};

/// `GET /sessions`: list active sessions.
///
/// # Errors
///
/// Returns [`PresenceError`] if the session store fails.
#[utoipa::path(
    get,
    path = "/api/v1/sessions",
    tag = "Sessions",
    summary = "List active sessions",
    description = "Returns every active session with its link state, oldest first.",
    responses(
        (status = 200, description = "Active sessions", body = SessionListResponse),
        (status = 500, description = "Session store failure", body = ErrorResponse),
    )
)]
pub async fn list_sessions(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, PresenceError> {
    let sessions = state.registry.list_sessions().await?;
    Ok(Json(SessionListResponse::from(sessions)))
}

/// Session routes, mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/sessions", get(list_sessions))
}
