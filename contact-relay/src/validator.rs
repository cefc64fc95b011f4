//! Submission validation and sanitization.
//!
//! Turns a parsed [`SubmissionRequest`] into a [`SanitizedSubmission`], or
//! reports the first field that fails. Fields are checked in the order
//! name, email, subject, message.
//!
//! Free-text fields are HTML-escaped here because the dispatcher embeds them
//! in an HTML email body.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const NAME_MAX_LEN: usize = 100;
pub const EMAIL_MAX_LEN: usize = 255;
pub const SUBJECT_MAX_LEN: usize = 200;
pub const MESSAGE_MAX_LEN: usize = 5000;

/// Raw contact form payload.
///
/// Every field is optional so that a missing field is reported by
/// validation rather than rejected as a malformed body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Form field names, in validation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Email,
    Subject,
    Message,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Email => write!(f, "email"),
            Self::Subject => write!(f, "subject"),
            Self::Message => write!(f, "message"),
        }
    }
}

/// The first field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: Field,
    pub message: &'static str,
}

impl ValidationError {
    fn new(field: Field, message: &'static str) -> Self {
        Self { field, message }
    }
}

/// A submission that passed validation.
///
/// Only [`validate`] builds one, so holding a value proves the fields are
/// trimmed, within bounds and escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedSubmission {
    name: String,
    email: String,
    subject: String,
    message: String,
}

impl SanitizedSubmission {
    /// Escaped sender name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Trimmed, lower-cased sender address.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Escaped subject, empty when none was given.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Escaped message body.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Validate and sanitize a raw submission.
///
/// The email check is stricter than a plain `local@domain.tld` shape: an
/// address containing `<`, `>`, `"`, `'` or `&` is rejected, because the
/// address is embedded unescaped in the HTML body. See [`is_valid_email`].
pub fn validate(raw: &SubmissionRequest) -> Result<SanitizedSubmission, ValidationError> {
    let name = trimmed(&raw.name);
    if name.is_empty() {
        return Err(ValidationError::new(Field::Name, "Name is required"));
    }
    if exceeds(name, NAME_MAX_LEN) {
        return Err(ValidationError::new(
            Field::Name,
            "Name must be 100 characters or less",
        ));
    }

    let email = trimmed(&raw.email);
    if email.is_empty() {
        return Err(ValidationError::new(Field::Email, "Email is required"));
    }
    if exceeds(email, EMAIL_MAX_LEN) {
        return Err(ValidationError::new(
            Field::Email,
            "Email must be 255 characters or less",
        ));
    }
    if !is_valid_email(email) {
        return Err(ValidationError::new(
            Field::Email,
            "Please provide a valid email address",
        ));
    }

    let subject = trimmed(&raw.subject);
    if exceeds(subject, SUBJECT_MAX_LEN) {
        return Err(ValidationError::new(
            Field::Subject,
            "Subject must be 200 characters or less",
        ));
    }

    let message = trimmed(&raw.message);
    if message.is_empty() {
        return Err(ValidationError::new(Field::Message, "Message is required"));
    }
    if exceeds(message, MESSAGE_MAX_LEN) {
        return Err(ValidationError::new(
            Field::Message,
            "Message must be 5000 characters or less",
        ));
    }

    Ok(SanitizedSubmission {
        name: escape_html(name),
        email: email.to_lowercase(),
        subject: escape_html(subject),
        message: escape_html(message),
    })
}

fn trimmed(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or("")
}

fn exceeds(value: &str, max: usize) -> bool {
    value.chars().count() > max
}

/// Check the `local@domain.tld` shape.
///
/// Both sides of the `@` are runs without whitespace or `@`, and the domain
/// holds a `.` with at least one character on each side. Markup characters
/// are refused as well, since the address is embedded unescaped.
pub fn is_valid_email(email: &str) -> bool {
    if email
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '<' | '>' | '"' | '\'' | '&'))
    {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Escape the five HTML-sensitive characters in a single pass.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
