//! Appointment status machine and slot materialization planning.
//!
//! Slots are consumed at booking time, not at completion time: `complete`
//! never touches a slot's booking counter. The planning half expands a
//! weekly template into the concrete dated slots a bank should offer;
//! the repository layer turns each planned slot into an
//! insert-on-absence so existing rows (and their booking counts) are
//! never overwritten.

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Status state machine
// ---------------------------------------------------------------------------

/// Status of an appointment, stored as text in `appointments.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "completed" => Ok(AppointmentStatus::Completed),
            other => Err(CoreError::Validation(format!(
                "Unknown appointment status: {other}"
            ))),
        }
    }

    /// Reachable statuses. The flow may skip explicit confirmation, so
    /// `complete` is legal from both `pending` and `confirmed`.
    pub fn valid_transitions(self) -> &'static [AppointmentStatus] {
        match self {
            AppointmentStatus::Pending => &[
                AppointmentStatus::Confirmed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::Completed,
            ],
            AppointmentStatus::Confirmed => {
                &[AppointmentStatus::Cancelled, AppointmentStatus::Completed]
            }
            AppointmentStatus::Cancelled | AppointmentStatus::Completed => &[],
        }
    }

    pub fn can_transition(self, to: AppointmentStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    pub fn validate_transition(self, to: AppointmentStatus) -> Result<(), CoreError> {
        if self.can_transition(to) {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                from: self.as_str().to_string(),
                to: to.as_str().to_string(),
            })
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Materialization planning
// ---------------------------------------------------------------------------

/// A weekly template row, as far as planning is concerned.
#[derive(Debug, Clone, Copy)]
pub struct SlotTemplate {
    /// 0 = Sunday through 6 = Saturday.
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_bookings: i32,
}

/// A concrete dated slot a template expands to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedSlot {
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_bookings: i32,
}

/// Expand active templates over an inclusive date range.
///
/// Output is ordered by (date, start_time) for stable insertion. The
/// caller upserts each planned slot with insert-on-absence semantics,
/// which is what makes repeated materialization idempotent.
pub fn plan_slots(
    templates: &[SlotTemplate],
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<PlannedSlot>, CoreError> {
    if from > to {
        return Err(CoreError::Validation(format!(
            "Invalid date range: {from} is after {to}"
        )));
    }
    for template in templates {
        if !(0..=6).contains(&template.day_of_week) {
            return Err(CoreError::Validation(format!(
                "Invalid day_of_week: {}",
                template.day_of_week
            )));
        }
    }

    let mut planned = Vec::new();
    let mut date = from;
    while date <= to {
        let weekday = date.weekday().num_days_from_sunday() as i16;
        for template in templates {
            if template.day_of_week == weekday {
                planned.push(PlannedSlot {
                    slot_date: date,
                    start_time: template.start_time,
                    end_time: template.end_time,
                    max_bookings: template.max_bookings,
                });
            }
        }
        date = date.succ_opt().ok_or_else(|| {
            CoreError::Validation(format!("Date out of range after {date}"))
        })?;
    }

    planned.sort_by_key(|s| (s.slot_date, s.start_time));
    Ok(planned)
}
