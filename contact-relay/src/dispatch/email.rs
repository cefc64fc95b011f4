//! Provider-bound email payload.

use serde::Serialize;

use crate::validator::SanitizedSubmission;

/// Subject used when the submitter left it blank.
pub const DEFAULT_SUBJECT: &str = "New Message";

/// JSON body sent to the email provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub reply_to: String,
}

/// Build the email for a validated submission.
///
/// All free-text fields arrive escaped, so they are embedded as-is.
pub fn build_email(submission: &SanitizedSubmission, from: &str, to: &str) -> OutboundEmail {
    OutboundEmail {
        from: from.to_string(),
        to: vec![to.to_string()],
        subject: compose_subject(submission),
        html: render_html(submission),
        reply_to: submission.email().to_string(),
    }
}

fn compose_subject(submission: &SanitizedSubmission) -> String {
    let subject = match submission.subject() {
        "" => DEFAULT_SUBJECT,
        s => s,
    };
    format!("Contact Form: {} - from {}", subject, submission.name())
}

fn render_html(submission: &SanitizedSubmission) -> String {
    let subject = match submission.subject() {
        "" => "(no subject)",
        s => s,
    };
    let message = submission.message().replace("\r\n", "\n").replace('\n', "<br>");

    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>New contact form submission</title></head>
<body style="font-family: sans-serif; line-height: 1.5; color: #333;">
<h2>New contact form submission</h2>
<p><strong>Name:</strong> {name}</p>
<p><strong>Email:</strong> <a href="mailto:{email}">{email}</a></p>
<p><strong>Subject:</strong> {subject}</p>
<hr>
<p><strong>Message:</strong></p>
<p>{message}</p>
</body>
</html>"#,
        name = submission.name(),
        email = submission.email(),
        subject = subject,
        message = message,
    )
}
