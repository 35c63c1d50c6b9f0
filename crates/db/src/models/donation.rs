//! Donation rows. A donation is a completed act and is immutable once
//! created; there are no update DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use lifelink_core::types::{DbId, Timestamp};

/// Source discriminator for `donations.source`.
pub const SOURCE_BLOOD_REQUEST: &str = "blood_request";
pub const SOURCE_APPOINTMENT: &str = "appointment";

/// A row from the `donations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Donation {
    pub id: DbId,
    pub donor_id: DbId,
    pub donor_type: String,
    pub request_id: Option<DbId>,
    pub blood_group: String,
    pub units: i32,
    pub source: String,
    pub appointment_id: Option<DbId>,
    pub donated_at: Timestamp,
}

/// DTO for recording a donation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDonation {
    pub donor_id: DbId,
    pub donor_type: String,
    pub request_id: Option<DbId>,
    pub blood_group: String,
    pub units: i32,
    pub source: String,
    pub appointment_id: Option<DbId>,
}
