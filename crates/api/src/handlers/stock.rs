//! Handlers for the per-bank blood stock ledger.

use axum::extract::{Path, State};
use axum::Json;

use lifelink_core::blood::BloodGroup;
use lifelink_core::types::DbId;
use lifelink_db::models::stock::{AdjustStock, SetStock};
use lifelink_db::repositories::BloodStockRepo;

use crate::error::AppResult;
use crate::state::AppState;

/// GET /api/v1/banks/{bank_id}/stock
pub async fn list_stock(
    State(state): State<AppState>,
    Path(bank_id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let stock = BloodStockRepo::list_for_bank(&state.pool, bank_id).await?;

    Ok(Json(serde_json::json!({ "data": stock })))
}

/// POST /api/v1/banks/{bank_id}/stock/adjust
///
/// Relative adjustment. A decrement below zero answers 409 and leaves
/// the row unchanged.
pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(bank_id): Path<DbId>,
    Json(input): Json<AdjustStock>,
) -> AppResult<Json<serde_json::Value>> {
    BloodGroup::parse(&input.blood_group)?;

    let units =
        BloodStockRepo::adjust(&state.pool, bank_id, &input.blood_group, input.delta).await?;

    Ok(Json(serde_json::json!({
        "data": {
            "blood_group": input.blood_group,
            "units_available": units,
        }
    })))
}

/// PUT /api/v1/banks/{bank_id}/stock
///
/// Absolute overwrite for manual corrections.
pub async fn set_stock(
    State(state): State<AppState>,
    Path(bank_id): Path<DbId>,
    Json(input): Json<SetStock>,
) -> AppResult<Json<serde_json::Value>> {
    BloodGroup::parse(&input.blood_group)?;

    let stock = BloodStockRepo::set(&state.pool, bank_id, &input.blood_group, input.units).await?;

    Ok(Json(serde_json::json!({ "data": stock })))
}
