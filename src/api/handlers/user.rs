//! Per-user link handlers.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::extractors::AuthUser;
use crate::api::state::AppState;
use crate::error::{AppError, Result};
use crate::service::log_deleted;

/// `GET /api/user/urls` - list the caller's links.
///
/// Returns 401 when the caller's id was issued on this request and 204 when
/// the caller has no links.
pub async fn list_urls(State(state): State<AppState>, user: AuthUser) -> Result<Response> {
    if user.is_new {
        return Err(AppError::Unauthorized);
    }

    let urls = state
        .url_service
        .user_urls(&user.user_id)
        .unwrap_or_default();

    if urls.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(Json(urls).into_response())
}

/// `DELETE /api/user/urls` - soft-delete a JSON array of short ids.
///
/// Answers 202 right away; the deletion runs in the background.
pub async fn delete_urls(
    State(state): State<AppState>,
    user: AuthUser,
    body: Bytes,
) -> Result<StatusCode> {
    if user.is_new {
        return Err(AppError::Unauthorized);
    }

    let short_ids: Vec<String> = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("expected a JSON array of ids: {e}")))?;

    let deleted = state
        .url_service
        .delete_user_urls(&user.user_id, short_ids)?;
    tokio::spawn(log_deleted(user.user_id, deleted));

    Ok(StatusCode::ACCEPTED)
}
