//! Error code constants.
//!
//! Error codes are organized by category:
//! - 2xxx: Authentication/Authorization errors
//! - 3xxx: Validation errors
//! - 4xxx: Link resolution errors
//! - 5xxx: Internal/System errors

/// Error code type with semantic categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(i32);

impl ErrorCode {
    // ===== Authentication/Authorization Errors (2xxx) =====

    /// No valid user identity.
    pub const UNAUTHORIZED: Self = Self(2001);

    /// Caller outside the trusted subnet.
    pub const FORBIDDEN: Self = Self(2002);

    // ===== Validation Errors (3xxx) =====

    /// Malformed request body.
    pub const BAD_REQUEST: Self = Self(3001);

    // ===== Link Errors (4xxx) =====

    /// Short id not known to the backend.
    pub const UNKNOWN_SHORT_ID: Self = Self(4001);

    /// Short id has been soft-deleted.
    pub const LINK_DELETED: Self = Self(4002);

    // ===== Internal/System Errors (5xxx) =====

    /// Storage backend error.
    pub const STORAGE_ERROR: Self = Self(5001);

    /// Internal server error.
    pub const INTERNAL_ERROR: Self = Self(5002);

    /// Get the error code as an i32.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Get the category of this error code.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self.0 {
            2000..=2999 => ErrorCategory::Authentication,
            3000..=3999 => ErrorCategory::Validation,
            4000..=4999 => ErrorCategory::Link,
            5000..=5999 => ErrorCategory::Internal,
            _ => ErrorCategory::Unknown,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        code.0
    }
}

/// Error category based on error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Authentication/authorization errors (2xxx).
    Authentication,
    /// Validation errors (3xxx).
    Validation,
    /// Link resolution errors (4xxx).
    Link,
    /// Internal/system errors (5xxx).
    Internal,
    /// Unknown category.
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::Validation => write!(f, "validation"),
            Self::Link => write!(f, "link"),
            Self::Internal => write!(f, "internal"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::UNAUTHORIZED.as_i32(), 2001);
        assert_eq!(ErrorCode::BAD_REQUEST.as_i32(), 3001);
        assert_eq!(ErrorCode::LINK_DELETED.as_i32(), 4002);
        assert_eq!(i32::from(ErrorCode::STORAGE_ERROR), 5001);
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            ErrorCode::FORBIDDEN.category(),
            ErrorCategory::Authentication
        );
        assert_eq!(ErrorCode::BAD_REQUEST.category(), ErrorCategory::Validation);
        assert_eq!(ErrorCode::UNKNOWN_SHORT_ID.category(), ErrorCategory::Link);
        assert_eq!(
            ErrorCode::INTERNAL_ERROR.category(),
            ErrorCategory::Internal
        );
        assert_eq!(ErrorCode(42).category().to_string(), "unknown");
    }
}
