//! Blood request rows, DTOs, and the dispatch log.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use lifelink_core::error::CoreError;
use lifelink_core::request::{Actor, ActorKind, RequestStatus};
use lifelink_core::types::{DbId, Timestamp};

/// A row from the `blood_requests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BloodRequest {
    pub id: DbId,
    pub requester_id: DbId,
    pub requester_type: String,
    pub blood_group: String,
    pub units_needed: i32,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub status: String,
    pub accepted_by: Option<DbId>,
    pub accepted_by_type: Option<String>,
    pub accepted_at: Option<Timestamp>,
    pub cancel_reason: Option<String>,
    pub last_cancel_reason: Option<String>,
    pub last_cancelled_by_name: Option<String>,
    pub created_at: Timestamp,
}

impl BloodRequest {
    /// The typed status of this row.
    pub fn status(&self) -> Result<RequestStatus, CoreError> {
        RequestStatus::parse(&self.status)
    }

    /// The requester as a typed actor.
    pub fn requester(&self) -> Result<Actor, CoreError> {
        Ok(Actor {
            kind: ActorKind::parse(&self.requester_type)?,
            id: self.requester_id,
        })
    }

    /// The acceptor as a typed actor, if the request has been accepted.
    pub fn acceptor(&self) -> Result<Option<Actor>, CoreError> {
        match (&self.accepted_by, &self.accepted_by_type) {
            (Some(id), Some(kind)) => Ok(Some(Actor {
                kind: ActorKind::parse(kind)?,
                id: *id,
            })),
            (None, None) => Ok(None),
            // Both-null-or-both-set is enforced by a table constraint.
            _ => Err(CoreError::InvariantViolation(format!(
                "Request {} has a half-set acceptor pair",
                self.id
            ))),
        }
    }
}

/// DTO for creating a blood request.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBloodRequest {
    pub requester_id: DbId,
    pub requester_type: String,
    pub blood_group: String,
    pub units_needed: i32,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
}

/// DTO for cancelling a request.
#[derive(Debug, Deserialize)]
pub struct CancelBloodRequest {
    pub reason: String,
    pub cancelled_by_name: String,
}

/// A row from the `request_notifications` dispatch log.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RequestNotification {
    pub id: DbId,
    pub request_id: DbId,
    pub recipient_id: DbId,
    pub recipient_type: String,
    pub delivered: bool,
    pub notified_at: Timestamp,
}
