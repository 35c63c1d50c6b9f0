//! Repositories for appointment slot tables: weekly templates
//! (`default_appointment_slots`) and materialized dated slots
//! (`appointment_slots`).

use chrono::NaiveDate;
use sqlx::PgPool;

use lifelink_core::appointment::{plan_slots, PlannedSlot, SlotTemplate};
use lifelink_core::types::DbId;

use crate::models::slot::{
    AppointmentSlot, CreateOneOffSlot, DefaultAppointmentSlot, UpsertDefaultSlot,
};
use crate::DbResult;

// ===========================================================================
// DefaultSlotRepo
// ===========================================================================

const DEFAULT_SLOT_COLUMNS: &str = "\
    id, blood_bank_id, day_of_week, start_time, end_time, max_bookings, \
    is_active, created_at, updated_at";

/// CRUD for the `default_appointment_slots` weekly template table.
pub struct DefaultSlotRepo;

impl DefaultSlotRepo {
    /// List a bank's template slots, ordered by weekday then start time.
    pub async fn list_for_bank(
        pool: &PgPool,
        blood_bank_id: DbId,
    ) -> Result<Vec<DefaultAppointmentSlot>, sqlx::Error> {
        let query = format!(
            "SELECT {DEFAULT_SLOT_COLUMNS} FROM default_appointment_slots \
             WHERE blood_bank_id = $1 \
             ORDER BY day_of_week, start_time"
        );
        sqlx::query_as::<_, DefaultAppointmentSlot>(&query)
            .bind(blood_bank_id)
            .fetch_all(pool)
            .await
    }

    /// List a bank's active template slots only (materialization source).
    pub async fn list_active_for_bank(
        pool: &PgPool,
        blood_bank_id: DbId,
    ) -> Result<Vec<DefaultAppointmentSlot>, sqlx::Error> {
        let query = format!(
            "SELECT {DEFAULT_SLOT_COLUMNS} FROM default_appointment_slots \
             WHERE blood_bank_id = $1 AND is_active = TRUE \
             ORDER BY day_of_week, start_time"
        );
        sqlx::query_as::<_, DefaultAppointmentSlot>(&query)
            .bind(blood_bank_id)
            .fetch_all(pool)
            .await
    }

    /// Create a template slot for a bank.
    pub async fn create(
        pool: &PgPool,
        blood_bank_id: DbId,
        input: &UpsertDefaultSlot,
    ) -> Result<DefaultAppointmentSlot, sqlx::Error> {
        let query = format!(
            "INSERT INTO default_appointment_slots \
             (blood_bank_id, day_of_week, start_time, end_time, max_bookings, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {DEFAULT_SLOT_COLUMNS}"
        );
        sqlx::query_as::<_, DefaultAppointmentSlot>(&query)
            .bind(blood_bank_id)
            .bind(input.day_of_week)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(input.max_bookings)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    /// Update a template slot.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpsertDefaultSlot,
    ) -> Result<Option<DefaultAppointmentSlot>, sqlx::Error> {
        let query = format!(
            "UPDATE default_appointment_slots \
             SET day_of_week = $2, start_time = $3, end_time = $4, \
                 max_bookings = $5, is_active = $6, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {DEFAULT_SLOT_COLUMNS}"
        );
        sqlx::query_as::<_, DefaultAppointmentSlot>(&query)
            .bind(id)
            .bind(input.day_of_week)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(input.max_bookings)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Deactivate a template slot. Future materializations skip it;
    /// already-materialized slots are untouched.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE default_appointment_slots \
             SET is_active = FALSE, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

// ===========================================================================
// AppointmentSlotRepo
// ===========================================================================

const SLOT_COLUMNS: &str = "\
    id, blood_bank_id, slot_date, start_time, end_time, max_bookings, \
    current_bookings, is_available, created_at, updated_at";

/// Operations on the `appointment_slots` table.
///
/// Booking mutations live in
/// [`AppointmentRepo`](crate::repositories::AppointmentRepo), which
/// pairs them with the appointment row in one transaction.
pub struct AppointmentSlotRepo;

impl AppointmentSlotRepo {
    /// Materialize a bank's active templates over an inclusive date
    /// range.
    ///
    /// Insert-on-absence per (bank, date, start_time): an existing row
    /// is never overwritten, so `current_bookings` on slots that
    /// already received bookings survives re-materialization. Returns
    /// the number of newly created slots.
    pub async fn materialize(
        pool: &PgPool,
        blood_bank_id: DbId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<u64> {
        let templates = DefaultSlotRepo::list_active_for_bank(pool, blood_bank_id).await?;
        let templates: Vec<SlotTemplate> = templates
            .iter()
            .map(|t| SlotTemplate {
                day_of_week: t.day_of_week,
                start_time: t.start_time,
                end_time: t.end_time,
                max_bookings: t.max_bookings,
            })
            .collect();

        let planned = plan_slots(&templates, from, to)?;

        let mut created = 0;
        for slot in planned {
            created += Self::insert_if_absent(pool, blood_bank_id, &slot).await?;
        }
        Ok(created)
    }

    async fn insert_if_absent(
        pool: &PgPool,
        blood_bank_id: DbId,
        slot: &PlannedSlot,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO appointment_slots \
             (blood_bank_id, slot_date, start_time, end_time, max_bookings) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (blood_bank_id, slot_date, start_time) DO NOTHING",
        )
        .bind(blood_bank_id)
        .bind(slot.slot_date)
        .bind(slot.start_time)
        .bind(slot.end_time)
        .bind(slot.max_bookings)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Create a one-off slot directly, bypassing the weekly template.
    pub async fn create_one_off(
        pool: &PgPool,
        blood_bank_id: DbId,
        input: &CreateOneOffSlot,
    ) -> Result<AppointmentSlot, sqlx::Error> {
        let query = format!(
            "INSERT INTO appointment_slots \
             (blood_bank_id, slot_date, start_time, end_time, max_bookings) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {SLOT_COLUMNS}"
        );
        sqlx::query_as::<_, AppointmentSlot>(&query)
            .bind(blood_bank_id)
            .bind(input.slot_date)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(input.max_bookings)
            .fetch_one(pool)
            .await
    }

    /// Find a slot by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<AppointmentSlot>, sqlx::Error> {
        let query = format!("SELECT {SLOT_COLUMNS} FROM appointment_slots WHERE id = $1");
        sqlx::query_as::<_, AppointmentSlot>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a bank's slots over an inclusive date range.
    pub async fn list_for_bank(
        pool: &PgPool,
        blood_bank_id: DbId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AppointmentSlot>, sqlx::Error> {
        let query = format!(
            "SELECT {SLOT_COLUMNS} FROM appointment_slots \
             WHERE blood_bank_id = $1 AND slot_date BETWEEN $2 AND $3 \
             ORDER BY slot_date, start_time"
        );
        sqlx::query_as::<_, AppointmentSlot>(&query)
            .bind(blood_bank_id)
            .bind(from)
            .bind(to)
            .fetch_all(pool)
            .await
    }

    /// List a bank's slots that still have capacity over a date range.
    pub async fn list_available_for_bank(
        pool: &PgPool,
        blood_bank_id: DbId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AppointmentSlot>, sqlx::Error> {
        let query = format!(
            "SELECT {SLOT_COLUMNS} FROM appointment_slots \
             WHERE blood_bank_id = $1 AND slot_date BETWEEN $2 AND $3 \
               AND is_available = TRUE AND current_bookings < max_bookings \
             ORDER BY slot_date, start_time"
        );
        sqlx::query_as::<_, AppointmentSlot>(&query)
            .bind(blood_bank_id)
            .bind(from)
            .bind(to)
            .fetch_all(pool)
            .await
    }
}
