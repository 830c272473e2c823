//! Signed `AuthToken` cookies.
//!
//! The cookie value is `<user_id>.<signature>`, where the signature is the
//! URL-safe base64 HMAC-SHA256 of the user id under the configured secret.
//! User ids are random UUIDs issued on first contact.

use std::time::Duration;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{AppError, Result};

/// Name of the authentication cookie.
pub const AUTH_COOKIE: &str = "AuthToken";

/// Lifetime of an issued cookie (30 days).
pub const COOKIE_MAX_AGE: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Signs and verifies `AuthToken` cookie values.
#[derive(Clone)]
pub struct CookieSigner {
    mac: Hmac<Sha256>,
}

impl std::fmt::Debug for CookieSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieSigner").finish_non_exhaustive()
    }
}

impl CookieSigner {
    /// Create a signer keyed by `secret`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is rejected by the MAC.
    pub fn new(secret: &[u8]) -> Result<Self> {
        let mac = Hmac::<Sha256>::new_from_slice(secret)
            .map_err(|e| AppError::Internal(format!("invalid cookie secret: {e}")))?;
        Ok(Self { mac })
    }

    /// Create a signer from the auth configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured secret is rejected by the MAC.
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        Self::new(config.cookie_secret.as_bytes())
    }

    /// Generate a fresh user id.
    #[must_use]
    pub fn new_user_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Produce the cookie value for `user_id`.
    #[must_use]
    pub fn sign(&self, user_id: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(user_id.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{user_id}.{signature}")
    }

    /// Return the user id carried by `value` if its signature checks out.
    #[must_use]
    pub fn verify(&self, value: &str) -> Option<String> {
        let (user_id, signature) = value.rsplit_once('.')?;
        if user_id.is_empty() {
            return None;
        }

        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;
        let mut mac = self.mac.clone();
        mac.update(user_id.as_bytes());
        mac.verify_slice(&signature).ok()?;

        Some(user_id.to_string())
    }
}
