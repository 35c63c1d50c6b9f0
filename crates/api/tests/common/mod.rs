#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use lifelink_api::config::ServerConfig;
use lifelink_api::notifier::LogNotifier;
use lifelink_api::router::build_app_router;
use lifelink_api::state::AppState;
use lifelink_core::types::DbId;

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        dispatch_radius_km: 35.0,
    }
}

/// Build the full application router with all middleware layers, using
/// the given database pool.
///
/// This mirrors the router construction in `main.rs` so integration
/// tests exercise the same middleware stack (CORS, request ID, timeout,
/// tracing, panic recovery) that production uses.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        notifier: Arc::new(LogNotifier),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Send a GET request to the app and return the raw response.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Send a POST request with a JSON body.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Send a POST request with an empty body (action endpoints).
pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Send a PUT request with a JSON body.
pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("PUT")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Send a DELETE request.
pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert the response has the given status and return its JSON body.
pub async fn assert_status(response: Response<Body>, expected: StatusCode) -> serde_json::Value {
    let status = response.status();
    let json = body_json(response).await;
    assert_eq!(status, expected, "unexpected status, body: {json}");
    json
}

// ---------------------------------------------------------------------------
// Fixture helpers
// ---------------------------------------------------------------------------

/// Insert a blood bank row and return its ID.
pub async fn create_bank(pool: &PgPool, name: &str) -> DbId {
    sqlx::query_scalar("INSERT INTO blood_banks (name, email) VALUES ($1, $2) RETURNING id")
        .bind(name)
        .bind(format!("{}@bank.test", name.to_lowercase().replace(' ', "-")))
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Insert a donor row and return its ID.
pub async fn create_donor(pool: &PgPool, name: &str, blood_group: &str) -> DbId {
    sqlx::query_scalar(
        "INSERT INTO donors (name, email, blood_group) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(name)
    .bind(format!("{}@donor.test", name.to_lowercase().replace(' ', "-")))
    .bind(blood_group)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Insert a bookable slot with the given capacity and return its ID.
pub async fn create_slot(pool: &PgPool, bank_id: DbId, max_bookings: i32) -> DbId {
    sqlx::query_scalar(
        "INSERT INTO appointment_slots \
         (blood_bank_id, slot_date, start_time, end_time, max_bookings) \
         VALUES ($1, '2026-09-07', '09:00', '10:00', $2) RETURNING id",
    )
    .bind(bank_id)
    .bind(max_bookings)
    .fetch_one(pool)
    .await
    .unwrap()
}
