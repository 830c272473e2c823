//! Health check handler.

use axum::{extract::State, http::StatusCode};

use crate::api::state::AppState;
use crate::error::Result;

/// `GET /ping` - 200 if the storage backend answers.
pub async fn ping(State(state): State<AppState>) -> Result<StatusCode> {
    state.url_service.ping().await?;
    Ok(StatusCode::OK)
}
