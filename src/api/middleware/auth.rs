//! Cookie authentication middleware.

use axum::{
    body::Body,
    extract::State,
    http::{
        HeaderMap, HeaderValue, Request,
        header::{COOKIE, SET_COOKIE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

use crate::api::extractors::AuthUser;
use crate::api::state::AppState;
use crate::error::AppError;
use crate::service::{AUTH_COOKIE, COOKIE_MAX_AGE, CookieSigner};

/// Find the `AuthToken` cookie among all `Cookie` headers.
fn auth_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == AUTH_COOKIE)
        .map(|(_, value)| value.trim().to_string())
}

/// Build the `Set-Cookie` header for a freshly issued user.
fn session_cookie(state: &AppState, user_id: &str) -> Option<HeaderValue> {
    let secure = if state.config.server.enable_https {
        "; Secure"
    } else {
        ""
    };
    let cookie = format!(
        "{AUTH_COOKIE}={}; Path=/; Max-Age={}; HttpOnly{secure}",
        state.cookies.sign(user_id),
        COOKIE_MAX_AGE.as_secs()
    );

    HeaderValue::from_str(&cookie)
        .inspect_err(|e| error!(error = %e, "Failed to encode auth cookie"))
        .ok()
}

/// Middleware that identifies the caller by the `AuthToken` cookie.
///
/// - A valid cookie attaches the carried user id.
/// - A cookie with a bad signature is rejected with 401.
/// - No cookie issues a new user id and sets the cookie on the response.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let user = match auth_cookie(req.headers()) {
        Some(value) => match state.cookies.verify(&value) {
            Some(user_id) => AuthUser::existing(user_id),
            None => {
                debug!("Rejected auth cookie with invalid signature");
                return AppError::Unauthorized.into_response();
            }
        },
        None => AuthUser::issued(CookieSigner::new_user_id()),
    };

    let set_cookie = if user.is_new {
        debug!(user_id = %user.user_id, "Issued new user id");
        session_cookie(&state, &user.user_id)
    } else {
        None
    };

    req.extensions_mut().insert(user);
    let mut response = next.run(req).await;

    if let Some(cookie) = set_cookie {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}
