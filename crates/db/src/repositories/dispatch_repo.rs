//! Repository for the `request_notifications` dispatch log.
//!
//! Recording is insert-on-absence against the unique
//! (request, recipient) constraint, so re-dispatching a request never
//! re-notifies an already-recorded recipient: only the rows that were
//! actually inserted come back to the caller for delivery.

use sqlx::PgPool;

use lifelink_core::request::Actor;
use lifelink_core::types::DbId;

use crate::models::blood_request::RequestNotification;

const NOTIFICATION_COLUMNS: &str = "\
    id, request_id, recipient_id, recipient_type, delivered, notified_at";

/// Operations on the `request_notifications` table.
pub struct DispatchLogRepo;

impl DispatchLogRepo {
    /// Record a dispatch attempt for one recipient.
    ///
    /// Returns `true` if the recipient was newly recorded (and should
    /// be notified), `false` if a prior dispatch already covered them.
    pub async fn record(pool: &PgPool, request_id: DbId, recipient: Actor) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO request_notifications (request_id, recipient_id, recipient_type) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (request_id, recipient_id, recipient_type) DO NOTHING",
        )
        .bind(request_id)
        .bind(recipient.id)
        .bind(recipient.kind.as_str())
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Mark a recorded recipient's delivery as successful.
    pub async fn mark_delivered(
        pool: &PgPool,
        request_id: DbId,
        recipient: Actor,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE request_notifications SET delivered = TRUE \
             WHERE request_id = $1 AND recipient_id = $2 AND recipient_type = $3",
        )
        .bind(request_id)
        .bind(recipient.id)
        .bind(recipient.kind.as_str())
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// List the dispatch log for a request, oldest first.
    pub async fn list_for_request(
        pool: &PgPool,
        request_id: DbId,
    ) -> Result<Vec<RequestNotification>, sqlx::Error> {
        let query = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM request_notifications \
             WHERE request_id = $1 \
             ORDER BY notified_at ASC, id ASC"
        );
        sqlx::query_as::<_, RequestNotification>(&query)
            .bind(request_id)
            .fetch_all(pool)
            .await
    }
}
