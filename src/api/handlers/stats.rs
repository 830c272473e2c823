//! Internal statistics handler.

use axum::{Json, extract::State};

use crate::api::state::AppState;
use crate::domain::StatsResponse;

/// `GET /api/internal/stats` - link and user counts.
pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.url_service.statistics())
}
