//! HTTP dispatch to the email provider (Resend-compatible API).

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

use super::email::{build_email, OutboundEmail};
use crate::config::Config;
use crate::util::fingerprint::email_fingerprint;
use crate::validator::SanitizedSubmission;

/// Longest provider error body kept for logs.
const ERROR_BODY_LOG_LIMIT: usize = 500;

/// Why a dispatch failed. Never shown to the submitter.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("email provider credential is not configured")]
    NotConfigured,

    #[error("email provider request timed out")]
    Timeout,

    #[error("email provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("email provider rejected the message with status {status}: {body}")]
    Rejected { status: StatusCode, body: String },
}

/// Result of a single dispatch attempt.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Provider accepted the message
    Sent {
        /// Provider message id, if it returned one
        id: Option<String>,
    },
    /// Provider call failed
    Failed(DispatchError),
}

impl DispatchOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, DispatchOutcome::Sent { .. })
    }
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    id: Option<String>,
}

/// Relays sanitized submissions to the provider. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    from: String,
    to: String,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            api_url: config.resend_api_url.clone(),
            api_key: config.resend_api_key.clone(),
            from: config.contact_from_email.clone(),
            to: config.contact_to_email.clone(),
            timeout: config.provider_timeout(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Build the email for `submission` and send it once. No retries.
    pub async fn dispatch(&self, submission: &SanitizedSubmission) -> DispatchOutcome {
        let email = build_email(submission, &self.from, &self.to);
        let sender = email_fingerprint(submission.email());

        match self.send(&email).await {
            Ok(id) => {
                info!(
                    provider_id = id.as_deref().unwrap_or(""),
                    sender = %sender,
                    message_length = submission.message().len(),
                    "dispatch_sent"
                );
                DispatchOutcome::Sent { id }
            }
            Err(e) => {
                error!(error = %e, sender = %sender, "dispatch_failed");
                DispatchOutcome::Failed(e)
            }
        }
    }

    async fn send(&self, email: &OutboundEmail) -> Result<Option<String>, DispatchError> {
        let api_key = self.api_key.as_deref().ok_or(DispatchError::NotConfigured)?;

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .timeout(self.timeout)
            .json(email)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DispatchError::Timeout
                } else {
                    DispatchError::Transport(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DispatchError::Rejected {
                status,
                body: truncate(&body, ERROR_BODY_LOG_LIMIT),
            });
        }

        // A 2xx with an unexpected body still counts as sent.
        let id = response
            .json::<SendResponse>()
            .await
            .ok()
            .and_then(|r| r.id);

        Ok(id)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
