//! Contact Relay - contact form submission handler.
//!
//! Accepts contact form submissions over HTTP, throttles abusive senders,
//! validates and sanitizes the fields, and relays the message to an email
//! provider.
//!
//! ## Architecture
//!
//! ```text
//! POST /api/contact → RateLimiter → validate → Dispatcher → email provider
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod limiter;
pub mod util;
pub mod validator;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use dispatch::{DispatchError, DispatchOutcome, Dispatcher};
pub use error::SubmitError;
pub use limiter::{RateLimitResult, RateLimiter};
pub use validator::{validate, SanitizedSubmission, SubmissionRequest, ValidationError};
pub use web::{router, AppState};
