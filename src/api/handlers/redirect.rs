//! Short link redirect handler.

use axum::{
    extract::{Path, State},
    response::Redirect,
};

use crate::api::state::AppState;
use crate::domain::Resolved;
use crate::error::{AppError, Result};

/// `GET /{id}` - 307 to the original URL, or 410 if the link was deleted.
pub async fn redirect(
    State(state): State<AppState>,
    Path(short_id): Path<String>,
) -> Result<Redirect> {
    match state.url_service.get_original_url(&short_id).await? {
        Resolved::Active(url) => Ok(Redirect::temporary(&url)),
        Resolved::Deleted => Err(AppError::Gone(short_id)),
    }
}
