//! Handlers for booking, cancelling, confirming and completing
//! appointments. Capacity enforcement lives in the repository's
//! transactional guards; handlers only validate input shape.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use lifelink_core::blood::BloodGroup;
use lifelink_core::error::CoreError;
use lifelink_core::types::DbId;
use lifelink_db::models::appointment::{Appointment, BookAppointment};
use lifelink_db::repositories::{AppointmentRepo, DonationRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/slots/{slot_id}/appointments
///
/// Book a slot. A full slot answers 409 and leaves no appointment row.
pub async fn book_appointment(
    State(state): State<AppState>,
    Path(slot_id): Path<DbId>,
    Json(input): Json<BookAppointment>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    BloodGroup::parse(&input.blood_group)?;

    if input.user_name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "user_name must not be empty".to_string(),
        )));
    }

    let appointment = AppointmentRepo::book(&state.pool, slot_id, &input).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "data": appointment })),
    ))
}

/// GET /api/v1/appointments/{id}
pub async fn get_appointment(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Appointment>>> {
    let appointment = AppointmentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Appointment",
            id,
        }))?;

    Ok(Json(DataResponse { data: appointment }))
}

/// GET /api/v1/users/{user_id}/appointments
pub async fn list_user_appointments(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let appointments = AppointmentRepo::list_for_user(&state.pool, user_id).await?;

    Ok(Json(serde_json::json!({ "data": appointments })))
}

/// GET /api/v1/users/{user_id}/donations
pub async fn list_user_donations(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let donations = DonationRepo::list_for_donor(&state.pool, user_id, "user").await?;

    Ok(Json(serde_json::json!({ "data": donations })))
}

/// POST /api/v1/appointments/{id}/cancel
///
/// Cancelling releases the slot's capacity in the same transaction.
pub async fn cancel_appointment(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let appointment = AppointmentRepo::cancel(&state.pool, id).await?;

    Ok(Json(serde_json::json!({ "data": appointment })))
}

/// POST /api/v1/appointments/{id}/confirm
pub async fn confirm_appointment(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let appointment = AppointmentRepo::confirm(&state.pool, id).await?;

    Ok(Json(serde_json::json!({ "data": appointment })))
}

/// POST /api/v1/appointments/{id}/complete
///
/// Marks the visit done and records the resulting donation.
pub async fn complete_appointment(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let (appointment, donation) = AppointmentRepo::complete(&state.pool, id).await?;

    Ok(Json(serde_json::json!({
        "data": { "appointment": appointment, "donation": donation }
    })))
}
