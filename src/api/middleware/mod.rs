//! HTTP middleware.

pub mod auth;
pub mod trusted;

pub use auth::authenticate;
pub use trusted::require_trusted_subnet;
