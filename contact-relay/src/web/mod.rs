//! Web server module for the contact endpoint.
//!
//! Routes:
//! - `POST /api/contact`: rate limit, validate, relay to the email provider
//! - `OPTIONS /api/contact`: CORS preflight
//! - `GET /health`: liveness

pub mod client;
pub mod handlers;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

pub use client::client_identifier;
pub use handlers::{health, submit_contact, AppState, HealthResponse};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(state.config.cors_allow_origin.as_deref());

    Router::new()
        .route("/health", get(health))
        .route("/api/contact", post(submit_contact))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allow_origin: Option<&str>) -> CorsLayer {
    let origin = match allow_origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => AllowOrigin::exact(origin),
        Some(Err(_)) => {
            warn!(origin = ?allow_origin, "cors_origin_invalid_allowing_any");
            AllowOrigin::any()
        }
        None => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}
