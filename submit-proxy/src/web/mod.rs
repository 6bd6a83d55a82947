//! Web server module.
//!
//! This module provides a thin web server that:
//! - Accepts multipart submissions on `/api/submit`
//! - Answers CORS preflights
//! - Forwards each submission to the Discord webhook and relays the result

pub mod cors;
pub mod handlers;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use cors::{cors_headers, with_cors};
pub use handlers::{health, preflight, submit, AppState, HealthResponse};

/// Path of the submit endpoint.
pub const SUBMIT_PATH: &str = "/api/submit";

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_request_bytes;

    Router::new()
        .route("/health", get(health))
        .route(
            SUBMIT_PATH,
            post(submit)
                .options(preflight)
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(middleware::from_fn(with_cors)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
