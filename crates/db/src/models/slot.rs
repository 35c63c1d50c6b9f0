//! Appointment slot rows: weekly templates and materialized dated slots.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use lifelink_core::types::{DbId, Timestamp};

/// A row from the `default_appointment_slots` table (weekly template,
/// never directly booked).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DefaultAppointmentSlot {
    pub id: DbId,
    pub blood_bank_id: DbId,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_bookings: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating/updating a weekly template slot.
#[derive(Debug, Deserialize)]
pub struct UpsertDefaultSlot {
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_bookings: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// A row from the `appointment_slots` table (concrete, bookable).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AppointmentSlot {
    pub id: DbId,
    pub blood_bank_id: DbId,
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_bookings: i32,
    pub current_bookings: i32,
    pub is_available: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a one-off slot that bypasses the weekly template.
#[derive(Debug, Deserialize)]
pub struct CreateOneOffSlot {
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_bookings: i32,
}

/// DTO for a materialization request over an inclusive date range.
#[derive(Debug, Deserialize)]
pub struct MaterializeRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

fn default_true() -> bool {
    true
}
