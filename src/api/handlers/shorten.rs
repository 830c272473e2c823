//! URL shortening handlers.

use std::sync::LazyLock;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use regex::Regex;

use crate::api::extractors::AuthUser;
use crate::api::state::AppState;
use crate::domain::{BatchRequestEntry, ShortenRequest, ShortenResponse};
use crate::error::{AppError, Result};

/// First `href` attribute in an HTML form body.
static HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href=['"]([^'"]+)['"]"#).expect("valid href pattern"));

const fn outcome_status(duplicate: bool) -> StatusCode {
    if duplicate {
        StatusCode::CONFLICT
    } else {
        StatusCode::CREATED
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(body: &Bytes) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("invalid JSON: {e}")))
}

/// Pull the URL out of a `POST /` body according to its content type.
///
/// JSON bodies carry `{"url": ...}`, HTML bodies carry the first `href`, and
/// anything else is taken as the raw URL.
fn extract_url(headers: &HeaderMap, body: &Bytes) -> Result<String> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("application/json") {
        let request: ShortenRequest = parse_json(body)?;
        return Ok(request.url);
    }

    let text = std::str::from_utf8(body)
        .map_err(|_| AppError::BadRequest("body is not valid UTF-8".to_string()))?;

    if content_type.starts_with("text/html") {
        return HREF
            .captures(text)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| AppError::BadRequest("no href found in HTML body".to_string()));
    }

    Ok(text.trim().to_string())
}

/// `POST /` - shorten a URL and answer with the short URL as plain text.
///
/// Returns 201 for a new link and 409 if the URL was already shortened.
pub async fn shorten_text(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let url = extract_url(&headers, &body)?;
    let outcome = state.url_service.shorten_url(&url, &user.user_id).await?;

    Ok((
        outcome_status(outcome.is_duplicate()),
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.url_service.short_url(outcome.short_id()),
    )
        .into_response())
}

/// `POST /api/shorten` - shorten `{"url": ...}` and answer `{"result": ...}`.
pub async fn shorten_json(
    State(state): State<AppState>,
    user: AuthUser,
    body: Bytes,
) -> Result<Response> {
    let request: ShortenRequest = parse_json(&body)?;
    let outcome = state
        .url_service
        .shorten_url(&request.url, &user.user_id)
        .await?;

    let status = outcome_status(outcome.is_duplicate());
    let response = ShortenResponse {
        result: state.url_service.short_url(outcome.short_id()),
    };

    Ok((status, Json(response)).into_response())
}

/// `POST /api/shorten/batch` - shorten a list of URLs, preserving order.
///
/// The status is 409 only when the last item was already shortened.
pub async fn shorten_batch(
    State(state): State<AppState>,
    user: AuthUser,
    body: Bytes,
) -> Result<Response> {
    let entries: Vec<BatchRequestEntry> = parse_json(&body)?;
    let shortened = state
        .url_service
        .shorten_batch(&user.user_id, entries)
        .await?;

    Ok((
        outcome_status(shortened.last_was_duplicate),
        Json(shortened.entries),
    )
        .into_response())
}
