//! Router setup and configuration.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer, compression::CompressionLayer,
    decompression::RequestDecompressionLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

use crate::api::handlers::{health, redirect, shorten, stats, user};
use crate::api::middleware::{authenticate, require_trusted_subnet};
use crate::api::state::AppState;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    // Health and redirect routes (no auth required)
    let public_routes = Router::new()
        .route("/ping", get(health::ping))
        .route("/{id}", get(redirect::redirect));

    // Routes that identify the caller by cookie
    let user_routes = Router::new()
        .route("/", post(shorten::shorten_text))
        .route("/api/shorten", post(shorten::shorten_json))
        .route("/api/shorten/batch", post(shorten::shorten_batch))
        .route(
            "/api/user/urls",
            get(user::list_urls).delete(user::delete_urls),
        )
        .layer(middleware::from_fn_with_state(state.clone(), authenticate));

    // Internal routes (trusted subnet only)
    let internal_routes = Router::new()
        .route("/stats", get(stats::stats))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_trusted_subnet,
        ));

    let layers = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.server.request_timeout,
        ))
        .layer(RequestDecompressionLayer::new())
        .layer(CompressionLayer::new());

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .nest("/api/internal", internal_routes)
        .layer(layers)
        .with_state(state)
}
