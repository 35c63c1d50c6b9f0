//! Repository for the `appointments` table and its pairing with the
//! parent slot's booking counter.
//!
//! The invariant this module protects: for every slot, at all times,
//! `current_bookings` equals the count of its non-cancelled
//! appointments and never exceeds `max_bookings`. Booking and
//! cancellation are therefore single transactions whose slot-counter
//! update is a conditional statement; the appointment row is only
//! written when that guard succeeds.

use sqlx::PgPool;

use lifelink_core::appointment::AppointmentStatus;
use lifelink_core::error::CoreError;
use lifelink_core::types::DbId;

use crate::models::appointment::{Appointment, BookAppointment};
use crate::models::donation::{CreateDonation, Donation, SOURCE_APPOINTMENT};
use crate::repositories::donation_repo::DonationRepo;
use crate::{DbError, DbResult};

const APPOINTMENT_COLUMNS: &str = "\
    id, slot_id, blood_bank_id, user_id, user_name, user_email, user_phone, \
    blood_group, appointment_date, appointment_time, status, notes, \
    created_at, updated_at";

/// Booking, cancellation and completion for the `appointments` table.
pub struct AppointmentRepo;

impl AppointmentRepo {
    /// Book a slot.
    ///
    /// Single transaction: a guarded increment on the slot
    /// (`current_bookings < max_bookings` in the WHERE clause), then the
    /// appointment insert with the slot's date/time snapshot. Zero rows
    /// from the increment means the slot is full: the transaction is
    /// rolled back and no appointment row persists. Under N concurrent
    /// attempts against capacity C, exactly min(N, C) commit.
    pub async fn book(
        pool: &PgPool,
        slot_id: DbId,
        input: &BookAppointment,
    ) -> DbResult<Appointment> {
        let mut tx = pool.begin().await?;

        let slot: Option<(DbId, chrono::NaiveDate, chrono::NaiveTime)> = sqlx::query_as(
            "UPDATE appointment_slots \
             SET current_bookings = current_bookings + 1, \
                 is_available = (current_bookings + 1 < max_bookings), \
                 updated_at = NOW() \
             WHERE id = $1 AND current_bookings < max_bookings \
             RETURNING blood_bank_id, slot_date, start_time",
        )
        .bind(slot_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((blood_bank_id, slot_date, start_time)) = slot else {
            tx.rollback().await?;
            tracing::debug!(slot_id, "Booking guard matched no row");
            return Err(Self::classify_lost_booking(pool, slot_id).await?);
        };

        let query = format!(
            "INSERT INTO appointments \
             (slot_id, blood_bank_id, user_id, user_name, user_email, user_phone, \
              blood_group, appointment_date, appointment_time, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {APPOINTMENT_COLUMNS}"
        );
        let appointment = sqlx::query_as::<_, Appointment>(&query)
            .bind(slot_id)
            .bind(blood_bank_id)
            .bind(input.user_id)
            .bind(&input.user_name)
            .bind(&input.user_email)
            .bind(&input.user_phone)
            .bind(&input.blood_group)
            .bind(slot_date)
            .bind(start_time)
            .bind(&input.notes)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(appointment)
    }

    /// Cancel an appointment and release its slot capacity.
    ///
    /// Single transaction: a guarded status flip (only from pending or
    /// confirmed), then a guarded decrement on the slot with
    /// `current_bookings >= 1` in the WHERE clause. A zero-row
    /// decrement would mean the counter and the appointment rows have
    /// diverged; that is a logic fault reported as
    /// [`CoreError::InvariantViolation`], not a silent no-op.
    pub async fn cancel(pool: &PgPool, id: DbId) -> DbResult<Appointment> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE appointments \
             SET status = 'cancelled', updated_at = NOW() \
             WHERE id = $1 AND status IN ('pending', 'confirmed') \
             RETURNING {APPOINTMENT_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Appointment>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(appointment) = updated else {
            tx.rollback().await?;
            return Err(
                Self::classify_lost_transition(pool, id, AppointmentStatus::Cancelled).await?,
            );
        };

        let released = sqlx::query(
            "UPDATE appointment_slots \
             SET current_bookings = current_bookings - 1, \
                 is_available = (current_bookings - 1 < max_bookings), \
                 updated_at = NOW() \
             WHERE id = $1 AND current_bookings >= 1",
        )
        .bind(appointment.slot_id)
        .execute(&mut *tx)
        .await?;

        if released.rows_affected() == 0 {
            tx.rollback().await?;
            tracing::error!(
                appointment_id = id,
                slot_id = appointment.slot_id,
                "Booking counter diverged from appointment rows"
            );
            return Err(CoreError::InvariantViolation(format!(
                "Slot {} has no bookings to release for appointment {id}",
                appointment.slot_id
            ))
            .into());
        }

        tx.commit().await?;
        Ok(appointment)
    }

    /// Confirm a pending appointment.
    pub async fn confirm(pool: &PgPool, id: DbId) -> DbResult<Appointment> {
        let query = format!(
            "UPDATE appointments \
             SET status = 'confirmed', updated_at = NOW() \
             WHERE id = $1 AND status = 'pending' \
             RETURNING {APPOINTMENT_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Appointment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        match updated {
            Some(appointment) => Ok(appointment),
            None => {
                Err(Self::classify_lost_transition(pool, id, AppointmentStatus::Confirmed).await?)
            }
        }
    }

    /// Complete an appointment and record the resulting donation.
    ///
    /// Legal from pending or confirmed (the flow may skip explicit
    /// confirmation). The slot's capacity was consumed at booking time,
    /// so completion never touches `current_bookings`.
    pub async fn complete(pool: &PgPool, id: DbId) -> DbResult<(Appointment, Donation)> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE appointments \
             SET status = 'completed', updated_at = NOW() \
             WHERE id = $1 AND status IN ('pending', 'confirmed') \
             RETURNING {APPOINTMENT_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Appointment>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(appointment) = updated else {
            tx.rollback().await?;
            return Err(
                Self::classify_lost_transition(pool, id, AppointmentStatus::Completed).await?,
            );
        };

        // One whole-blood unit per completed appointment.
        let donation = DonationRepo::create_in_tx(
            &mut tx,
            &CreateDonation {
                donor_id: appointment.user_id,
                donor_type: "user".to_string(),
                request_id: None,
                blood_group: appointment.blood_group.clone(),
                units: 1,
                source: SOURCE_APPOINTMENT.to_string(),
                appointment_id: Some(appointment.id),
            },
        )
        .await?;

        tx.commit().await?;
        Ok((appointment, donation))
    }

    /// Find an appointment by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Appointment>, sqlx::Error> {
        let query = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = $1");
        sqlx::query_as::<_, Appointment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's appointments, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<Appointment>, sqlx::Error> {
        let query = format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments \
             WHERE user_id = $1 \
             ORDER BY appointment_date DESC, appointment_time DESC, id DESC"
        );
        sqlx::query_as::<_, Appointment>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Count a slot's non-cancelled appointments (the value
    /// `current_bookings` must always equal).
    pub async fn count_active_for_slot(pool: &PgPool, slot_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM appointments WHERE slot_id = $1 AND status != 'cancelled'",
        )
        .bind(slot_id)
        .fetch_one(pool)
        .await
    }

    /// Work out why a guarded booking affected zero rows.
    async fn classify_lost_booking(pool: &PgPool, slot_id: DbId) -> Result<DbError, sqlx::Error> {
        let exists: Option<DbId> =
            sqlx::query_scalar("SELECT id FROM appointment_slots WHERE id = $1")
                .bind(slot_id)
                .fetch_optional(pool)
                .await?;
        Ok(match exists {
            Some(_) => CoreError::SlotFull.into(),
            None => CoreError::NotFound {
                entity: "AppointmentSlot",
                id: slot_id,
            }
            .into(),
        })
    }

    /// Work out why a guarded status flip affected zero rows.
    async fn classify_lost_transition(
        pool: &PgPool,
        id: DbId,
        to: AppointmentStatus,
    ) -> Result<DbError, sqlx::Error> {
        let current = Self::find_by_id(pool, id).await?;
        Ok(match current {
            None => CoreError::NotFound {
                entity: "Appointment",
                id,
            }
            .into(),
            Some(appointment) => match appointment.status() {
                Ok(status) => CoreError::InvalidTransition {
                    from: status.as_str().to_string(),
                    to: to.as_str().to_string(),
                }
                .into(),
                Err(err) => err.into(),
            },
        })
    }
}
