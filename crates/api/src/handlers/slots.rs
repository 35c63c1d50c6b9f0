//! Handlers for weekly template slots and materialized dated slots.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use chrono::NaiveDate;
use lifelink_core::error::CoreError;
use lifelink_core::types::DbId;
use lifelink_db::models::slot::{
    AppointmentSlot, CreateOneOffSlot, MaterializeRange, UpsertDefaultSlot,
};
use lifelink_db::repositories::{AppointmentSlotRepo, DefaultSlotRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /banks/{bank_id}/slots`.
#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// If `true`, return only slots with remaining capacity.
    pub available_only: Option<bool>,
}

fn validate_template(input: &UpsertDefaultSlot) -> AppResult<()> {
    if !(0..=6).contains(&input.day_of_week) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "day_of_week must be 0..=6 (0 = Sunday), got {}",
            input.day_of_week
        ))));
    }
    if input.start_time >= input.end_time {
        return Err(AppError::Core(CoreError::Validation(
            "start_time must be before end_time".to_string(),
        )));
    }
    if input.max_bookings < 1 {
        return Err(AppError::Core(CoreError::Validation(format!(
            "max_bookings must be at least 1, got {}",
            input.max_bookings
        ))));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Weekly templates
// ---------------------------------------------------------------------------

/// GET /api/v1/banks/{bank_id}/default-slots
pub async fn list_default_slots(
    State(state): State<AppState>,
    Path(bank_id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let slots = DefaultSlotRepo::list_for_bank(&state.pool, bank_id).await?;

    Ok(Json(serde_json::json!({ "data": slots })))
}

/// POST /api/v1/banks/{bank_id}/default-slots
pub async fn create_default_slot(
    State(state): State<AppState>,
    Path(bank_id): Path<DbId>,
    Json(input): Json<UpsertDefaultSlot>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    validate_template(&input)?;

    let slot = DefaultSlotRepo::create(&state.pool, bank_id, &input).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "data": slot })),
    ))
}

/// PUT /api/v1/default-slots/{id}
pub async fn update_default_slot(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpsertDefaultSlot>,
) -> AppResult<Json<serde_json::Value>> {
    validate_template(&input)?;

    let slot = DefaultSlotRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "DefaultAppointmentSlot",
            id,
        }))?;

    Ok(Json(serde_json::json!({ "data": slot })))
}

/// DELETE /api/v1/default-slots/{id}
///
/// Deactivation, not deletion: already-materialized slots keep their
/// bookings; future materializations skip the template.
pub async fn deactivate_default_slot(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let found = DefaultSlotRepo::deactivate(&state.pool, id).await?;

    if !found {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "DefaultAppointmentSlot",
            id,
        }));
    }

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Dated slots
// ---------------------------------------------------------------------------

/// POST /api/v1/banks/{bank_id}/slots/materialize
///
/// Expand the bank's active templates over an inclusive date range.
/// Idempotent: re-running creates only the slots that do not exist yet.
pub async fn materialize_slots(
    State(state): State<AppState>,
    Path(bank_id): Path<DbId>,
    Json(range): Json<MaterializeRange>,
) -> AppResult<Json<serde_json::Value>> {
    let created = AppointmentSlotRepo::materialize(&state.pool, bank_id, range.from, range.to)
        .await?;

    Ok(Json(serde_json::json!({ "data": { "created": created } })))
}

/// POST /api/v1/banks/{bank_id}/slots
///
/// Create a one-off slot that bypasses the weekly template.
pub async fn create_one_off_slot(
    State(state): State<AppState>,
    Path(bank_id): Path<DbId>,
    Json(input): Json<CreateOneOffSlot>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    if input.start_time >= input.end_time {
        return Err(AppError::Core(CoreError::Validation(
            "start_time must be before end_time".to_string(),
        )));
    }
    if input.max_bookings < 1 {
        return Err(AppError::Core(CoreError::Validation(format!(
            "max_bookings must be at least 1, got {}",
            input.max_bookings
        ))));
    }

    let slot = AppointmentSlotRepo::create_one_off(&state.pool, bank_id, &input).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "data": slot })),
    ))
}

/// GET /api/v1/banks/{bank_id}/slots?from=...&to=...&available_only=true
pub async fn list_slots(
    State(state): State<AppState>,
    Path(bank_id): Path<DbId>,
    Query(params): Query<SlotQuery>,
) -> AppResult<Json<serde_json::Value>> {
    if params.from > params.to {
        return Err(AppError::BadRequest(
            "from must not be after to".to_string(),
        ));
    }

    let slots = if params.available_only.unwrap_or(false) {
        AppointmentSlotRepo::list_available_for_bank(&state.pool, bank_id, params.from, params.to)
            .await?
    } else {
        AppointmentSlotRepo::list_for_bank(&state.pool, bank_id, params.from, params.to).await?
    };

    Ok(Json(serde_json::json!({ "data": slots })))
}

/// GET /api/v1/slots/{id}
pub async fn get_slot(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<AppointmentSlot>>> {
    let slot = AppointmentSlotRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "AppointmentSlot",
            id,
        }))?;

    Ok(Json(DataResponse { data: slot }))
}
