//! Repository for the `blood_requests` table and its lifecycle.
//!
//! All status moves are conditional updates guarded on the current
//! status; a zero-rows-affected outcome means the caller lost a race or
//! attempted an illegal transition, and is mapped to the corresponding
//! typed error after a re-read of the row.

use sqlx::PgPool;

use lifelink_core::error::CoreError;
use lifelink_core::request::{Actor, RequestStatus};
use lifelink_core::types::DbId;

use crate::models::blood_request::{BloodRequest, CancelBloodRequest, CreateBloodRequest};
use crate::models::donation::{CreateDonation, Donation, SOURCE_BLOOD_REQUEST};
use crate::repositories::donation_repo::DonationRepo;
use crate::repositories::stock_repo::BloodStockRepo;
use crate::{DbError, DbResult};

const REQUEST_COLUMNS: &str = "\
    id, requester_id, requester_type, blood_group, units_needed, \
    latitude, longitude, address, status, accepted_by, accepted_by_type, \
    accepted_at, cancel_reason, last_cancel_reason, last_cancelled_by_name, \
    created_at";

/// Lifecycle operations for the `blood_requests` table.
pub struct BloodRequestRepo;

impl BloodRequestRepo {
    /// Persist a new request with status `active`.
    pub async fn create(
        pool: &PgPool,
        input: &CreateBloodRequest,
    ) -> Result<BloodRequest, sqlx::Error> {
        let query = format!(
            "INSERT INTO blood_requests \
             (requester_id, requester_type, blood_group, units_needed, \
              latitude, longitude, address) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {REQUEST_COLUMNS}"
        );
        sqlx::query_as::<_, BloodRequest>(&query)
            .bind(input.requester_id)
            .bind(&input.requester_type)
            .bind(&input.blood_group)
            .bind(input.units_needed)
            .bind(input.latitude)
            .bind(input.longitude)
            .bind(&input.address)
            .fetch_one(pool)
            .await
    }

    /// Find a request by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<BloodRequest>, sqlx::Error> {
        let query = format!("SELECT {REQUEST_COLUMNS} FROM blood_requests WHERE id = $1");
        sqlx::query_as::<_, BloodRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List requests, optionally filtered by status, newest first.
    pub async fn list(
        pool: &PgPool,
        status: Option<RequestStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<BloodRequest>, sqlx::Error> {
        match status {
            Some(status) => {
                let query = format!(
                    "SELECT {REQUEST_COLUMNS} FROM blood_requests \
                     WHERE status = $1 \
                     ORDER BY created_at DESC, id DESC \
                     LIMIT $2 OFFSET $3"
                );
                sqlx::query_as::<_, BloodRequest>(&query)
                    .bind(status.as_str())
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(pool)
                    .await
            }
            None => {
                let query = format!(
                    "SELECT {REQUEST_COLUMNS} FROM blood_requests \
                     ORDER BY created_at DESC, id DESC \
                     LIMIT $1 OFFSET $2"
                );
                sqlx::query_as::<_, BloodRequest>(&query)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(pool)
                    .await
            }
        }
    }

    /// Accept an active request.
    ///
    /// Concurrent accept attempts resolve to exactly one winner: the
    /// update is guarded on `status = 'active'`, so the losing caller
    /// sees zero rows and gets [`CoreError::AlreadyAccepted`] (or
    /// [`CoreError::InvalidTransition`] if the request is terminal).
    pub async fn accept(pool: &PgPool, id: DbId, acceptor: Actor) -> DbResult<BloodRequest> {
        let query = format!(
            "UPDATE blood_requests \
             SET status = 'accepted', accepted_by = $2, accepted_by_type = $3, \
                 accepted_at = NOW() \
             WHERE id = $1 AND status = 'active' \
             RETURNING {REQUEST_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, BloodRequest>(&query)
            .bind(id)
            .bind(acceptor.id)
            .bind(acceptor.kind.as_str())
            .fetch_optional(pool)
            .await?;

        match updated {
            Some(request) => Ok(request),
            None => {
                tracing::debug!(request_id = id, "Accept guard matched no row");
                Err(Self::classify_lost_accept(pool, id).await?)
            }
        }
    }

    /// Fulfill an accepted request.
    ///
    /// Runs in a single transaction: the status flip is guarded on
    /// `status = 'accepted'`; a blood-bank fulfiller additionally
    /// consumes stock through the ledger guard (insufficient stock
    /// aborts the whole fulfillment); every fulfillment records an
    /// immutable donation row.
    pub async fn fulfill(pool: &PgPool, id: DbId) -> DbResult<(BloodRequest, Donation)> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE blood_requests \
             SET status = 'fulfilled' \
             WHERE id = $1 AND status = 'accepted' \
             RETURNING {REQUEST_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, BloodRequest>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(request) = updated else {
            tx.rollback().await?;
            return Err(Self::classify_lost_transition(pool, id, RequestStatus::Fulfilled).await?);
        };

        let acceptor = request.acceptor()?.ok_or_else(|| {
            CoreError::InvariantViolation(format!("Accepted request {id} has no acceptor"))
        })?;

        // A fulfilling blood bank hands out stored units; everyone else
        // donates in person.
        if acceptor.kind == lifelink_core::request::ActorKind::BloodBank {
            BloodStockRepo::adjust_in_tx(
                &mut tx,
                acceptor.id,
                &request.blood_group,
                -request.units_needed,
            )
            .await?;
        }

        let donation = DonationRepo::create_in_tx(
            &mut tx,
            &CreateDonation {
                donor_id: acceptor.id,
                donor_type: acceptor.kind.as_str().to_string(),
                request_id: Some(request.id),
                blood_group: request.blood_group.clone(),
                units: request.units_needed,
                source: SOURCE_BLOOD_REQUEST.to_string(),
                appointment_id: None,
            },
        )
        .await?;

        tx.commit().await?;
        Ok((request, donation))
    }

    /// Cancel an active or accepted request, recording the audit trail.
    ///
    /// `cancel_reason` keeps the first recorded reason; the `last_*`
    /// pair always reflects the most recent cancel event.
    pub async fn cancel(
        pool: &PgPool,
        id: DbId,
        input: &CancelBloodRequest,
    ) -> DbResult<BloodRequest> {
        let query = format!(
            "UPDATE blood_requests \
             SET status = 'cancelled', \
                 cancel_reason = COALESCE(cancel_reason, $2), \
                 last_cancel_reason = $2, \
                 last_cancelled_by_name = $3 \
             WHERE id = $1 AND status IN ('active', 'accepted') \
             RETURNING {REQUEST_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, BloodRequest>(&query)
            .bind(id)
            .bind(&input.reason)
            .bind(&input.cancelled_by_name)
            .fetch_optional(pool)
            .await?;

        match updated {
            Some(request) => Ok(request),
            None => Err(Self::classify_lost_transition(pool, id, RequestStatus::Cancelled).await?),
        }
    }

    /// Work out why a guarded accept affected zero rows.
    async fn classify_lost_accept(pool: &PgPool, id: DbId) -> Result<DbError, sqlx::Error> {
        let current = Self::find_by_id(pool, id).await?;
        Ok(match current {
            None => CoreError::NotFound {
                entity: "BloodRequest",
                id,
            }
            .into(),
            Some(request) => match request.status() {
                Ok(RequestStatus::Accepted) => CoreError::AlreadyAccepted.into(),
                Ok(status) => CoreError::InvalidTransition {
                    from: status.as_str().to_string(),
                    to: RequestStatus::Accepted.as_str().to_string(),
                }
                .into(),
                Err(err) => err.into(),
            },
        })
    }

    /// Work out why a guarded transition to `to` affected zero rows.
    async fn classify_lost_transition(
        pool: &PgPool,
        id: DbId,
        to: RequestStatus,
    ) -> Result<DbError, sqlx::Error> {
        let current = Self::find_by_id(pool, id).await?;
        Ok(match current {
            None => CoreError::NotFound {
                entity: "BloodRequest",
                id,
            }
            .into(),
            Some(request) => match request.status() {
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
