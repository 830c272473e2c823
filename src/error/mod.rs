//! Error handling module.
//!
//! Two layers of errors live here: [`StorageError`] is what backends return,
//! [`AppError`] is what handlers return and knows how to render itself as an
//! HTTP response.

pub mod codes;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

pub use codes::ErrorCode;

/// Application-level error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed request body or parameters.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// No user identity could be established for a write.
    #[error("Authentication failed")]
    Unauthorized,

    /// Caller is not allowed to reach the resource.
    #[error("Access forbidden")]
    Forbidden,

    /// Short identifier is not known to the backend.
    #[error("Unknown short id: {0}")]
    UnknownShortId(String),

    /// Short identifier was soft-deleted.
    #[error("Link has been deleted: {0}")]
    Gone(String),

    /// Storage backend error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the error code for this error.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::BadRequest(_) => ErrorCode::BAD_REQUEST,
            Self::Unauthorized => ErrorCode::UNAUTHORIZED,
            Self::Forbidden => ErrorCode::FORBIDDEN,
            Self::UnknownShortId(_) => ErrorCode::UNKNOWN_SHORT_ID,
            Self::Gone(_) => ErrorCode::LINK_DELETED,
            Self::Storage(_) => ErrorCode::STORAGE_ERROR,
            Self::Internal(_) => ErrorCode::INTERNAL_ERROR,
        }
    }

    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::UnknownShortId(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Gone(_) => StatusCode::GONE,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code().as_i32();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(error_code = code, status = %status, message = %message, "Request failed");
        } else {
            tracing::debug!(error_code = code, status = %status, message = %message, "Request rejected");
        }

        let body = Json(json!({
            "code": code,
            "message": message,
            "data": null
        }));

        (status, body).into_response()
    }
}

/// Storage-specific error type.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Connection error.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Query execution error.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// File I/O error.
    #[error("File I/O error: {0}")]
    FileIO(String),

    /// Short identifier not present in the backend.
    #[error("short id not found: {0}")]
    NotFound(String),

    /// Backend not available.
    #[error("Storage backend unavailable")]
    Unavailable,
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::FileIO(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => Self::Connection(err.to_string()),
            other => Self::Query(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StorageError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Migration(err.to_string())
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias using `StorageError`.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::UnknownShortId("abc".to_string()).error_code(),
            ErrorCode::UNKNOWN_SHORT_ID
        );
        assert_eq!(AppError::Unauthorized.error_code(), ErrorCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Storage(StorageError::Unavailable).error_code(),
            ErrorCode::STORAGE_ERROR
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::UnknownShortId("abc".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Gone("abc".to_string()).status_code(),
            StatusCode::GONE
        );
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::Storage(StorageError::Query("boom".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_io_error_maps_to_file_io() {
        let err: StorageError = std::io::Error::other("disk full").into();
        assert!(matches!(err, StorageError::FileIO(msg) if msg.contains("disk full")));
    }

    #[test]
    fn test_pool_closed_maps_to_connection() {
        let err: StorageError = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, StorageError::Connection(_)));
    }
}
