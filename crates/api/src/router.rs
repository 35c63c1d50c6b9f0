//! Shared application router builder.
//!
//! Provides [`build_app_router`] so both the production binary (`main.rs`)
//! and integration tests (`tests/common/mod.rs`) use the exact same
//! middleware stack.

use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, StatusCode};
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::handlers;
use crate::state::AppState;

/// Build the full application [`Router`] with all middleware layers.
///
/// The middleware stack is applied bottom-up:
///
/// 1. CORS
/// 2. Set request ID on incoming requests
/// 3. Structured request/response tracing
/// 4. Propagate request ID to response
/// 5. Request timeout
/// 6. Panic recovery (catch panics, return 500)
pub fn build_app_router(state: AppState, config: &ServerConfig) -> Router {
    let cors = build_cors_layer(config);
    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        // Health check at root level (not under /api/v1).
        .merge(handlers::health::router())
        // API v1 routes.
        .nest("/api/v1", api_routes())
        // -- Middleware stack (applied bottom-up) --
        // Panic recovery: catch panics and return 500 JSON.
        .layer(CatchPanicLayer::new())
        // Request timeout.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        // Propagate request ID to response.
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        // Structured request/response tracing.
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Set request ID on incoming requests.
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        // CORS.
        .layer(cors)
        // Shared state.
        .with_state(state)
}

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /requests                                 create (POST), list (?status, limit, offset)
/// /requests/{id}                            get
/// /requests/{id}/notifications              dispatch log (GET)
/// /requests/{id}/donations                  backing donations (GET)
/// /requests/{id}/accept                     accept (POST, first caller wins)
/// /requests/{id}/fulfill                    fulfill (POST)
/// /requests/{id}/cancel                     cancel (POST)
///
/// /banks/{bank_id}/default-slots            list, create weekly templates
/// /default-slots/{id}                       update (PUT), deactivate (DELETE)
/// /banks/{bank_id}/slots/materialize        expand templates over a range (POST)
/// /banks/{bank_id}/slots                    one-off create (POST), list (?from, to, available_only)
/// /slots/{id}                               get
/// /slots/{slot_id}/appointments             book (POST)
///
/// /appointments/{id}                        get
/// /appointments/{id}/cancel                 cancel (POST, releases capacity)
/// /appointments/{id}/confirm                confirm (POST)
/// /appointments/{id}/complete               complete (POST, records donation)
/// /users/{user_id}/appointments             list (GET)
/// /users/{user_id}/donations                list (GET)
///
/// /banks/{bank_id}/stock                    list (GET), set (PUT)
/// /banks/{bank_id}/stock/adjust             relative adjust (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // --- Blood requests ---
        .route(
            "/requests",
            post(handlers::requests::create_request).get(handlers::requests::list_requests),
        )
        .route("/requests/{id}", get(handlers::requests::get_request))
        .route(
            "/requests/{id}/notifications",
            get(handlers::requests::list_request_notifications),
        )
        .route(
            "/requests/{id}/donations",
            get(handlers::requests::list_request_donations),
        )
        .route(
            "/requests/{id}/accept",
            post(handlers::requests::accept_request),
        )
        .route(
            "/requests/{id}/fulfill",
            post(handlers::requests::fulfill_request),
        )
        .route(
            "/requests/{id}/cancel",
            post(handlers::requests::cancel_request),
        )
        // --- Weekly templates ---
        .route(
            "/banks/{bank_id}/default-slots",
            get(handlers::slots::list_default_slots).post(handlers::slots::create_default_slot),
        )
        .route(
            "/default-slots/{id}",
            put(handlers::slots::update_default_slot)
                .delete(handlers::slots::deactivate_default_slot),
        )
        // --- Dated slots ---
        .route(
            "/banks/{bank_id}/slots/materialize",
            post(handlers::slots::materialize_slots),
        )
        .route(
            "/banks/{bank_id}/slots",
            post(handlers::slots::create_one_off_slot).get(handlers::slots::list_slots),
        )
        .route("/slots/{id}", get(handlers::slots::get_slot))
        // --- Appointments ---
        .route(
            "/slots/{slot_id}/appointments",
            post(handlers::appointments::book_appointment),
        )
        .route(
            "/appointments/{id}",
            get(handlers::appointments::get_appointment),
        )
        .route(
            "/appointments/{id}/cancel",
            post(handlers::appointments::cancel_appointment),
        )
        .route(
            "/appointments/{id}/confirm",
            post(handlers::appointments::confirm_appointment),
        )
        .route(
            "/appointments/{id}/complete",
            post(handlers::appointments::complete_appointment),
        )
        .route(
            "/users/{user_id}/appointments",
            get(handlers::appointments::list_user_appointments),
        )
        .route(
            "/users/{user_id}/donations",
            get(handlers::appointments::list_user_donations),
        )
        // --- Stock ledger ---
        .route(
            "/banks/{bank_id}/stock",
            get(handlers::stock::list_stock).put(handlers::stock::set_stock),
        )
        .route(
            "/banks/{bank_id}/stock/adjust",
            post(handlers::stock::adjust_stock),
        )
}

/// Build the CORS middleware layer from server configuration.
///
/// Panics at startup if any configured origin is invalid, which is the
/// desired behaviour -- we want misconfiguration to fail fast.
pub fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
