//! Application state for Axum handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::Result;
use crate::service::{CookieSigner, UrlService, UserRegistry};
use crate::storage::traits::Storage;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Storage backend.
    pub storage: Arc<dyn Storage>,
    /// URL service.
    pub url_service: Arc<UrlService>,
    /// Auth cookie signer.
    pub cookies: Arc<CookieSigner>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the cookie secret is unusable.
    pub fn new(config: Arc<AppConfig>, storage: Arc<dyn Storage>) -> Result<Self> {
        let url_service = Arc::new(UrlService::new(
            Arc::clone(&storage),
            Arc::new(UserRegistry::new()),
            config.server.base_url.clone(),
            config.deletion.workers,
        ));

        let cookies = Arc::new(CookieSigner::from_config(&config.auth)?);

        Ok(Self {
            config,
            storage,
            url_service,
            cookies,
        })
    }
}
