//! Outbound email dispatch.
//!
//! This module provides:
//! - The provider-bound email built from a sanitized submission
//! - The HTTP dispatcher that relays it to the provider
//!
//! ```text
//! SanitizedSubmission → OutboundEmail → Dispatcher → provider API
//! ```

pub mod email;
pub mod provider;

pub use email::{build_email, OutboundEmail, DEFAULT_SUBJECT};
pub use provider::{DispatchError, DispatchOutcome, Dispatcher};
