//! End-to-end tests for the contact endpoint.
//!
//! The router is driven in-process; the email provider is a local axum
//! server on an ephemeral port that records what it receives.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{header, HeaderMap, Method, Request, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;

use contact_relay::{router, AppState, Config, Dispatcher, RateLimiter};

#[derive(Clone, Default)]
struct FakeProvider {
    received: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

impl FakeProvider {
    fn received(&self) -> Vec<(Option<String>, Value)> {
        self.received.lock().unwrap().clone()
    }
}

async fn accept_email(
    State(provider): State<FakeProvider>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    provider.received.lock().unwrap().push((auth, body));
    Json(json!({ "id": "email_123" }))
}

async fn reject_email() -> impl IntoResponse {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "name": "validation_error", "message": "secret provider detail" })),
    )
}

/// Start a fake provider and return its URL.
async fn spawn_provider(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/emails", addr)
}

async fn app_with_provider(api_url: String) -> Router {
    let config = Config {
        resend_api_key: Some("re_test".to_string()),
        resend_api_url: api_url,
        contact_to_email: "owner@example.com".to_string(),
        provider_timeout_ms: 2_000,
        ..Config::default()
    };
    let limiter = Arc::new(RateLimiter::new(
        config.rate_limit_window(),
        config.rate_limit_max_requests,
    ));
    let dispatcher = Dispatcher::new(reqwest::Client::new(), &config);
    router(AppState::new(config, limiter, dispatcher))
}

async fn accepting_app() -> (Router, FakeProvider) {
    let provider = FakeProvider::default();
    let url = spawn_provider(
        Router::new()
            .route("/emails", post(accept_email))
            .with_state(provider.clone()),
    )
    .await;
    (app_with_provider(url).await, provider)
}

fn contact_request(ip: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/contact")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", ip)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, body)
}

#[tokio::test]
async fn test_valid_submission_is_relayed() {
    let (app, provider) = accepting_app().await;

    let (status, _, body) = send(
        &app,
        contact_request(
            "203.0.113.1",
            json!({ "name": "Ann", "email": "Ann@Example.com", "subject": "", "message": "Hi" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let received = provider.received();
    assert_eq!(received.len(), 1);
    let (auth, email) = &received[0];
    assert_eq!(auth.as_deref(), Some("Bearer re_test"));
    assert_eq!(email["to"][0], "owner@example.com");
    assert_eq!(email["reply_to"], "ann@example.com");
    assert_eq!(email["subject"], "Contact Form: New Message - from Ann");
}

#[tokio::test]
async fn test_empty_name_rejected_without_dispatch() {
    let (app, provider) = accepting_app().await;

    let (status, _, body) = send(
        &app,
        contact_request(
            "203.0.113.2",
            json!({ "name": "", "email": "x@x.com", "message": "hi" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["errors"][0]["field"], "name");
    assert_eq!(body["errors"][0]["message"], "Name is required");
    assert!(provider.received().is_empty());
}

#[tokio::test]
async fn test_invalid_email_rejected() {
    let (app, provider) = accepting_app().await;

    let (status, _, body) = send(
        &app,
        contact_request(
            "203.0.113.3",
            json!({ "name": "Bob", "email": "not-an-email", "message": "hi" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "email");
    assert!(provider.received().is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_generic_bad_request() {
    let (app, provider) = accepting_app().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/contact")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "203.0.113.4")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request body");
    assert!(body.get("errors").is_none());

    let (status, _, _) = send(
        &app,
        contact_request("203.0.113.4", json!({ "name": 42, "email": "a@b.co", "message": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(provider.received().is_empty());
}

#[tokio::test]
async fn test_sixth_submission_throttled_before_validation() {
    let (app, provider) = accepting_app().await;
    let valid = json!({ "name": "Ann", "email": "ann@example.com", "message": "Hi" });

    for i in 0..5 {
        let (status, _, _) = send(&app, contact_request("198.51.100.9", valid.clone())).await;
        assert_eq!(status, StatusCode::OK, "submission {} should pass", i + 1);
    }

    // Invalid body still gets 429: the limiter runs first
    let (status, headers, body) = send(
        &app,
        contact_request("198.51.100.9", json!({ "name": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["success"], false);
    assert!(body.get("errors").is_none());

    let retry_after: u64 = headers[header::RETRY_AFTER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry_after));

    assert_eq!(provider.received().len(), 5);

    // Another client is unaffected
    let (status, _, _) = send(&app, contact_request("198.51.100.10", valid)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_provider_failure_is_generic() {
    let url = spawn_provider(Router::new().route("/emails", post(reject_email))).await;
    let app = app_with_provider(url).await;

    let (status, _, body) = send(
        &app,
        contact_request(
            "203.0.113.5",
            json!({ "name": "Ann", "email": "ann@example.com", "message": "Hi" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Failed to send message. Please try again later.");
    assert!(!body.to_string().contains("secret provider detail"));
}

#[tokio::test]
async fn test_unreachable_provider_is_generic_failure() {
    let app = app_with_provider("http://127.0.0.1:1/emails".to_string()).await;

    let (status, _, body) = send(
        &app,
        contact_request(
            "203.0.113.6",
            json!({ "name": "Ann", "email": "ann@example.com", "message": "Hi" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to send message. Please try again later.");
}

#[tokio::test]
async fn test_script_markup_escaped_in_outbound_body() {
    let (app, provider) = accepting_app().await;

    let (status, _, _) = send(
        &app,
        contact_request(
            "203.0.113.7",
            json!({
                "name": "Eve",
                "email": "eve@example.com",
                "subject": "Hello",
                "message": "<script>alert('x')</script>\nbye"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let received = provider.received();
    let html = received[0].1["html"].as_str().unwrap();
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;<br>bye"));
    assert_eq!(received[0].1["subject"], "Contact Form: Hello - from Eve");
}

#[tokio::test]
async fn test_cors_preflight() {
    let (app, _) = accepting_app().await;

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/contact")
        .header(header::ORIGIN, "https://site.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn test_health() {
    let (app, _) = accepting_app().await;

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_provider_timeout_is_bounded() {
    async fn slow() -> impl IntoResponse {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Json(json!({ "id": "late" }))
    }

    let url = spawn_provider(Router::new().route("/emails", post(slow))).await;
    let app = app_with_provider(url).await;

    let started = std::time::Instant::now();
    let (status, _, _) = send(
        &app,
        contact_request(
            "203.0.113.8",
            json!({ "name": "Ann", "email": "ann@example.com", "message": "Hi" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(started.elapsed() < Duration::from_secs(5));
}
