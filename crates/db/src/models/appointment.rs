//! Appointment rows and booking DTOs.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use lifelink_core::appointment::AppointmentStatus;
use lifelink_core::error::CoreError;
use lifelink_core::types::{DbId, Timestamp};

/// A row from the `appointments` table.
///
/// `appointment_date` / `appointment_time` are snapshots of the slot at
/// booking time; later slot edits do not rewrite them.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Appointment {
    pub id: DbId,
    pub slot_id: DbId,
    pub blood_bank_id: DbId,
    pub user_id: DbId,
    pub user_name: String,
    pub user_email: String,
    pub user_phone: Option<String>,
    pub blood_group: String,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Appointment {
    /// The typed status of this row.
    pub fn status(&self) -> Result<AppointmentStatus, CoreError> {
        AppointmentStatus::parse(&self.status)
    }
}

/// DTO for booking a slot.
#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointment {
    pub user_id: DbId,
    pub user_name: String,
    pub user_email: String,
    pub user_phone: Option<String>,
    pub blood_group: String,
    pub notes: Option<String>,
}
