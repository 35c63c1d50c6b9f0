//! Handlers for the `/requests` resource: creation with fan-out,
//! lifecycle transitions, and the dispatch log.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use lifelink_core::blood::BloodGroup;
use lifelink_core::error::CoreError;
use lifelink_core::geo::GeoPoint;
use lifelink_core::request::{Actor, ActorKind, RequestStatus};
use lifelink_core::types::DbId;
use lifelink_db::models::blood_request::{CancelBloodRequest, CreateBloodRequest};
use lifelink_db::repositories::{BloodRequestRepo, DispatchLogRepo, DonationRepo};

use crate::dispatch::dispatch_request;
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query / request types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /requests`.
#[derive(Debug, Deserialize)]
pub struct RequestQuery {
    /// Optional status filter (`active`, `accepted`, `fulfilled`, `cancelled`).
    pub status: Option<String>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}

/// Body for `POST /requests/{id}/accept`.
#[derive(Debug, Deserialize)]
pub struct AcceptRequest {
    pub acceptor_id: DbId,
    pub acceptor_type: String,
}

/// Maximum page size for request listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for request listing.
const DEFAULT_LIMIT: i64 = 50;

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/requests
///
/// Create a blood request and spawn the notification fan-out. The
/// response never waits on candidate selection or delivery.
pub async fn create_request(
    State(state): State<AppState>,
    Json(input): Json<CreateBloodRequest>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    BloodGroup::parse(&input.blood_group)?;
    ActorKind::parse(&input.requester_type)?;

    if input.units_needed < 1 {
        return Err(AppError::Core(CoreError::Validation(format!(
            "units_needed must be at least 1, got {}",
            input.units_needed
        ))));
    }

    // Reject malformed coordinates up front; a half-set pair is as bad
    // as an out-of-range one.
    match (input.latitude, input.longitude) {
        (Some(lat), Some(lng)) => {
            GeoPoint::new(lat, lng)?;
        }
        (None, None) => {}
        _ => {
            return Err(AppError::BadRequest(
                "latitude and longitude must be provided together".to_string(),
            ));
        }
    }

    let request = BloodRequestRepo::create(&state.pool, &input).await?;

    tokio::spawn(dispatch_request(state.clone(), request.clone()));

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "data": request })),
    ))
}

/// GET /api/v1/requests
///
/// List requests, optionally filtered by status, newest first.
pub async fn list_requests(
    State(state): State<AppState>,
    Query(params): Query<RequestQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let status = params
        .status
        .as_deref()
        .map(RequestStatus::parse)
        .transpose()?;
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let offset = params.offset.unwrap_or(0);

    let requests = BloodRequestRepo::list(&state.pool, status, limit, offset).await?;

    Ok(Json(serde_json::json!({ "data": requests })))
}

/// GET /api/v1/requests/{id}
pub async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<lifelink_db::models::blood_request::BloodRequest>>> {
    let request = BloodRequestRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "BloodRequest",
            id,
        }))?;

    Ok(Json(DataResponse { data: request }))
}

/// GET /api/v1/requests/{id}/notifications
///
/// The dispatch log for a request: who was selected, and whether
/// delivery succeeded.
pub async fn list_request_notifications(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let notifications = DispatchLogRepo::list_for_request(&state.pool, id).await?;

    Ok(Json(serde_json::json!({ "data": notifications })))
}

/// GET /api/v1/requests/{id}/donations
pub async fn list_request_donations(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let donations = DonationRepo::list_for_request(&state.pool, id).await?;

    Ok(Json(serde_json::json!({ "data": donations })))
}

/// POST /api/v1/requests/{id}/accept
///
/// First accepted caller wins; everyone else gets 409.
pub async fn accept_request(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<AcceptRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let acceptor = Actor {
        kind: ActorKind::parse(&input.acceptor_type)?,
        id: input.acceptor_id,
    };

    let request = BloodRequestRepo::accept(&state.pool, id, acceptor).await?;

    Ok(Json(serde_json::json!({ "data": request })))
}

/// POST /api/v1/requests/{id}/fulfill
///
/// Flips the request to `fulfilled` and records the backing donation.
/// A blood-bank acceptor additionally consumes ledger stock; when the
/// stock guard fails the whole fulfillment rolls back.
pub async fn fulfill_request(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let (request, donation) = BloodRequestRepo::fulfill(&state.pool, id).await?;

    Ok(Json(serde_json::json!({
        "data": { "request": request, "donation": donation }
    })))
}

/// POST /api/v1/requests/{id}/cancel
pub async fn cancel_request(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CancelBloodRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let request = BloodRequestRepo::cancel(&state.pool, id, &input).await?;

    Ok(Json(serde_json::json!({ "data": request })))
}
