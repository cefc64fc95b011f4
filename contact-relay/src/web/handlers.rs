//! Contact endpoint handlers.
//!
//! A submission runs through three steps, each of which can end it:
//! 1. Rate limit on the client identifier (before the body is looked at)
//! 2. Parse and validate the body
//! 3. Dispatch to the email provider

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::error::{ContactResponse, SubmitError};
use crate::limiter::{RateLimitResult, RateLimiter};
use crate::util::fingerprint::email_fingerprint;
use crate::validator::{validate, SubmissionRequest};
use crate::web::client::client_identifier;
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub limiter: Arc<RateLimiter>,
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(config: Config, limiter: Arc<RateLimiter>, dispatcher: Dispatcher) -> Self {
        Self {
            config: Arc::new(config),
            limiter,
            dispatcher,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Contact Submission
// =============================================================================

/// Contact form endpoint.
///
/// The body is extracted as a `Result` so that a throttled client gets a 429
/// even when its payload is also malformed.
pub async fn submit_contact(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Result<Json<SubmissionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, SubmitError> {
    let identifier = client_identifier(
        &headers,
        peer.map(|ConnectInfo(addr)| addr),
        state.config.trust_proxy_headers,
    );

    if let RateLimitResult::Limited { retry_after } =
        state.limiter.check(&identifier, Instant::now()).await
    {
        warn!(
            identifier = %identifier,
            retry_after_secs = retry_after.as_secs(),
            "submission_rate_limited"
        );
        return Err(SubmitError::RateLimited { retry_after });
    }

    let Json(raw) = body.map_err(|rejection| {
        warn!(
            identifier = %identifier,
            status = rejection.status().as_u16(),
            error = %rejection.body_text(),
            "submission_malformed"
        );
        SubmitError::MalformedRequest(rejection.body_text())
    })?;

    info!(
        identifier = %identifier,
        name_length = raw.name.as_ref().map(|s| s.len()).unwrap_or(0),
        message_length = raw.message.as_ref().map(|s| s.len()).unwrap_or(0),
        has_subject = raw.subject.as_ref().is_some_and(|s| !s.trim().is_empty()),
        "submission_received"
    );

    let submission = validate(&raw).map_err(|err| {
        info!(
            identifier = %identifier,
            field = %err.field,
            reason = err.message,
            "submission_invalid"
        );
        SubmitError::InvalidInput(err)
    })?;

    match state.dispatcher.dispatch(&submission).await {
        DispatchOutcome::Sent { .. } => {
            info!(
                identifier = %identifier,
                sender = %email_fingerprint(submission.email()),
                "submission_relayed"
            );
            Ok((StatusCode::OK, Json(ContactResponse::sent())))
        }
        DispatchOutcome::Failed(e) => Err(SubmitError::ProviderFailure(e)),
    }
}
