//! Request-level errors and their HTTP mapping.

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::dispatch::DispatchError;
use crate::validator::ValidationError;

/// Everything that can end a contact submission early.
///
/// All variants are terminal for the request; none are retried internally.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    #[error("provider failure: {0}")]
    ProviderFailure(#[from] DispatchError),

    #[error("malformed request: {0}")]
    MalformedRequest(String),
}

/// JSON body returned by the contact endpoint.
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ValidationError>>,
}

impl ContactResponse {
    pub fn sent() -> Self {
        Self {
            success: true,
            message: Some("Message sent successfully"),
            error: None,
            errors: None,
        }
    }

    fn failure(error: &'static str) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error),
            errors: None,
        }
    }
}

impl SubmitError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::InvalidInput(_) | Self::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            Self::ProviderFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SubmitError {
    fn into_response(self) -> Response {
        let status = self.status();

        match self {
            Self::RateLimited { retry_after } => {
                // Round up so clients never retry before the window resets.
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                let mut response = (
                    status,
                    Json(ContactResponse::failure(
                        "Too many requests. Please try again later.",
                    )),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(secs.max(1)));
                response
            }
            Self::InvalidInput(err) => {
                let mut body = ContactResponse::failure("Validation failed");
                body.errors = Some(vec![err]);
                (status, Json(body)).into_response()
            }
            Self::MalformedRequest(_) => {
                (status, Json(ContactResponse::failure("Invalid request body"))).into_response()
            }
            // Provider detail stays in the logs.
            Self::ProviderFailure(_) => (
                status,
                Json(ContactResponse::failure(
                    "Failed to send message. Please try again later.",
                )),
            )
                .into_response(),
        }
    }
}
