//! Per-bank, per-group blood stock rows.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use lifelink_core::types::{DbId, Timestamp};

/// A row from the `blood_stock` table, unique per (bank, blood group).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BloodStock {
    pub id: DbId,
    pub blood_bank_id: DbId,
    pub blood_group: String,
    pub units_available: i32,
    pub updated_at: Timestamp,
}

/// DTO for a relative stock adjustment.
#[derive(Debug, Deserialize)]
pub struct AdjustStock {
    pub blood_group: String,
    pub delta: i32,
}

/// DTO for an absolute stock overwrite (manual correction).
#[derive(Debug, Deserialize)]
pub struct SetStock {
    pub blood_group: String,
    pub units: i32,
}
