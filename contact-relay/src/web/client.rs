//! Client identifier resolution for rate limiting.

use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderMap;

use crate::limiter::UNKNOWN_IDENTIFIER;

/// Pick the best available client address.
///
/// Order: first `X-Forwarded-For` entry, then `X-Real-IP` (both only when
/// proxy headers are trusted), then the TCP peer. Unattributable clients
/// share the [`UNKNOWN_IDENTIFIER`] bucket.
pub fn client_identifier(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_proxy_headers: bool,
) -> String {
    if trust_proxy_headers {
        let forwarded = header_ip(headers, "x-forwarded-for", |v| v.split(',').next());
        let real_ip = || header_ip(headers, "x-real-ip", Some);

        if let Some(ip) = forwarded.or_else(real_ip) {
            return ip.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_IDENTIFIER.to_string())
}

/// Parse an IP out of a header, ignoring values that are not addresses.
fn header_ip<'a>(
    headers: &'a HeaderMap,
    name: &str,
    select: impl FnOnce(&'a str) -> Option<&'a str>,
) -> Option<IpAddr> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(select)
        .and_then(|v| v.trim().parse().ok())
}
