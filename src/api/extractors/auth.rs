//! Authenticated user extractor.

use axum::{extract::FromRequestParts, http::request::Parts};
use std::future::Future;

use crate::error::AppError;

/// Caller identity attached by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// User id carried by the `AuthToken` cookie.
    pub user_id: String,
    /// Whether the id was issued on this request rather than presented.
    pub is_new: bool,
}

impl AuthUser {
    /// A user who presented a valid cookie.
    #[must_use]
    pub const fn existing(user_id: String) -> Self {
        Self {
            user_id,
            is_new: false,
        }
    }

    /// A user whose id was just issued.
    #[must_use]
    pub const fn issued(user_id: String) -> Self {
        Self {
            user_id,
            is_new: true,
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        // Set by the auth middleware
        let result = parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(AppError::Unauthorized);
        std::future::ready(result)
    }
}
