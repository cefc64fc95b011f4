//! Contact Relay web server.
//!
//! This binary:
//! - Serves the contact endpoint and CORS preflight
//! - Rate limits submissions per client address
//! - Validates and sanitizes every submission
//! - Relays accepted submissions to the email provider
//!
//! Nothing is persisted; the only state is the in-memory rate limit table.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::{net::TcpListener, signal};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use contact_relay::{router, AppState, Config, Dispatcher, RateLimiter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("contact_relay_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        provider_configured = config.resend_api_key.is_some(),
        provider_url = %config.resend_api_url,
        rate_limit_window_secs = config.rate_limit_window_secs,
        rate_limit_max_requests = config.rate_limit_max_requests,
        trust_proxy_headers = config.trust_proxy_headers,
        cors_allow_origin = ?config.cors_allow_origin,
        "config_loaded"
    );

    if config.resend_api_key.is_none() {
        warn!("provider_credential_missing_all_dispatches_will_fail");
    }

    let client = Client::builder()
        .timeout(config.provider_timeout())
        .build()
        .context("Failed to build HTTP client")?;

    let limiter = Arc::new(RateLimiter::new(
        config.rate_limit_window(),
        config.rate_limit_max_requests,
    ));
    let dispatcher = Dispatcher::new(client, &config);

    spawn_pruner(
        limiter.clone(),
        Duration::from_secs(config.rate_limit_prune_interval_secs),
    );

    let state = AppState::new(config.clone(), limiter, dispatcher);
    let app = router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "contact_relay_listening");

    // Peer addresses feed the rate limiter when no proxy header is present
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("contact_relay_shutdown_complete");

    Ok(())
}

/// Periodically drop expired rate limit records.
fn spawn_pruner(limiter: Arc<RateLimiter>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let removed = limiter.prune(Instant::now()).await;
            if removed > 0 {
                let tracked = limiter.tracked().await;
                info!(removed, tracked, "rate_limiter_pruned");
            } else {
                debug!("rate_limiter_prune_noop");
            }
        }
    });
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("contact_relay_shutting_down");
}
