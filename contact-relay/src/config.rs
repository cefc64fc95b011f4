//! Configuration module for environment variable parsing.
//!
//! All configuration comes from the process environment. There is no
//! configuration file.

use std::env;
use std::time::Duration;

use tracing::warn;
use url::Url;

/// Default Resend API endpoint for sending a single email.
pub const DEFAULT_RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Default sender used when `CONTACT_FROM_EMAIL` is not set.
pub const DEFAULT_FROM_EMAIL: &str = "Contact Form <onboarding@resend.dev>";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Bearer credential for the email provider
    pub resend_api_key: Option<String>,

    /// Email provider endpoint
    pub resend_api_url: String,

    /// Fixed recipient of every contact message
    pub contact_to_email: String,

    /// Sender address presented to the provider
    pub contact_from_email: String,

    /// Rate limiter window length in seconds
    pub rate_limit_window_secs: u64,

    /// Maximum admitted submissions per identifier per window
    pub rate_limit_max_requests: u32,

    /// How often stale rate limit records are pruned, in seconds
    pub rate_limit_prune_interval_secs: u64,

    /// Timeout for the outbound provider call in milliseconds
    pub provider_timeout_ms: u64,

    /// Whether X-Forwarded-For / X-Real-IP are trusted for the client address
    pub trust_proxy_headers: bool,

    /// Allowed CORS origin. `None` allows any origin.
    pub cors_allow_origin: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            resend_api_key: None,
            resend_api_url: DEFAULT_RESEND_API_URL.to_string(),
            contact_to_email: "contact@example.com".to_string(),
            contact_from_email: DEFAULT_FROM_EMAIL.to_string(),
            rate_limit_window_secs: 60,
            rate_limit_max_requests: 5,
            rate_limit_prune_interval_secs: 60,
            provider_timeout_ms: 10_000,
            trust_proxy_headers: true,
            cors_allow_origin: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            port: parse_or("PORT", defaults.port),

            resend_api_key: non_empty("RESEND_API_KEY"),

            resend_api_url: parse_url("RESEND_API_URL", &defaults.resend_api_url),

            contact_to_email: non_empty("CONTACT_TO_EMAIL").unwrap_or(defaults.contact_to_email),

            contact_from_email: non_empty("CONTACT_FROM_EMAIL")
                .unwrap_or(defaults.contact_from_email),

            rate_limit_window_secs: parse_positive(
                "RATE_LIMIT_WINDOW_SECS",
                defaults.rate_limit_window_secs,
            ),

            rate_limit_max_requests: parse_positive(
                "RATE_LIMIT_MAX_REQUESTS",
                defaults.rate_limit_max_requests,
            ),

            rate_limit_prune_interval_secs: parse_positive(
                "RATE_LIMIT_PRUNE_INTERVAL_SECS",
                defaults.rate_limit_prune_interval_secs,
            ),

            provider_timeout_ms: parse_positive("PROVIDER_TIMEOUT_MS", defaults.provider_timeout_ms),

            trust_proxy_headers: parse_bool("TRUST_PROXY_HEADERS", defaults.trust_proxy_headers),

            cors_allow_origin: non_empty("CORS_ALLOW_ORIGIN").filter(|o| o != "*"),
        }
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }
}

/// Read a variable, treating blank values as unset.
fn non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    let raw = match non_empty(name) {
        Some(v) => v,
        None => return default,
    };

    match raw.parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

/// Parse a numeric variable that must be greater than zero.
fn parse_positive<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + PartialOrd + Default + Copy,
{
    let value = parse_or(name, default);
    if value > T::default() {
        value
    } else {
        warn!(env_var = name, "Value must be positive, using default");
        default
    }
}

fn parse_bool(name: &str, default: bool) -> bool {
    match non_empty(name).map(|v| v.to_lowercase()) {
        None => default,
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                warn!(env_var = name, value = %v, "Invalid boolean, using default");
                default
            }
        },
    }
}

/// Parse an absolute URL, falling back to `default` if it does not parse.
fn parse_url(name: &str, default: &str) -> String {
    match non_empty(name) {
        None => default.to_string(),
        Some(raw) => match Url::parse(&raw) {
            Ok(url) if url.has_host() => url.to_string(),
            _ => {
                warn!(env_var = name, value = %raw, "Invalid URL, using default");
                default.to_string()
            }
        },
    }
}
