//! Blood request lifecycle: actors and the status state machine.
//!
//! Requests move `active -> accepted -> fulfilled`, with cancellation
//! allowed from `active` or `accepted`. `fulfilled` and `cancelled` are
//! terminal; a request is never physically deleted, only transitioned.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Actors
// ---------------------------------------------------------------------------

/// The kind of party that can raise, accept, or fulfill a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    User,
    Ngo,
    BloodBank,
}

impl ActorKind {
    /// The string stored in `requester_type` / `accepted_by_type` columns.
    pub fn as_str(self) -> &'static str {
        match self {
            ActorKind::User => "user",
            ActorKind::Ngo => "ngo",
            ActorKind::BloodBank => "blood_bank",
        }
    }

    /// Parse a stored actor-type string.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "user" => Ok(ActorKind::User),
            "ngo" => Ok(ActorKind::Ngo),
            "blood_bank" => Ok(ActorKind::BloodBank),
            other => Err(CoreError::Validation(format!("Unknown actor type: {other}"))),
        }
    }
}

/// A typed (kind, id) pair replacing the loosely-coupled
/// `*_id` + `*_type` column pairs at the domain boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub kind: ActorKind,
    pub id: DbId,
}

impl Actor {
    pub fn user(id: DbId) -> Self {
        Self { kind: ActorKind::User, id }
    }

    pub fn ngo(id: DbId) -> Self {
        Self { kind: ActorKind::Ngo, id }
    }

    pub fn blood_bank(id: DbId) -> Self {
        Self { kind: ActorKind::BloodBank, id }
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Status of a blood request, stored as text in `blood_requests.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Active,
    Accepted,
    Fulfilled,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Active => "active",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Fulfilled => "fulfilled",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "active" => Ok(RequestStatus::Active),
            "accepted" => Ok(RequestStatus::Accepted),
            "fulfilled" => Ok(RequestStatus::Fulfilled),
            "cancelled" => Ok(RequestStatus::Cancelled),
            other => Err(CoreError::Validation(format!(
                "Unknown request status: {other}"
            ))),
        }
    }

    /// The set of statuses reachable from `self`. Terminal states
    /// (`fulfilled`, `cancelled`) return an empty slice.
    pub fn valid_transitions(self) -> &'static [RequestStatus] {
        match self {
            RequestStatus::Active => &[RequestStatus::Accepted, RequestStatus::Cancelled],
            RequestStatus::Accepted => &[RequestStatus::Fulfilled, RequestStatus::Cancelled],
            RequestStatus::Fulfilled | RequestStatus::Cancelled => &[],
        }
    }

    pub fn can_transition(self, to: RequestStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    /// Validate a transition, producing the typed error for illegal moves.
    pub fn validate_transition(self, to: RequestStatus) -> Result<(), CoreError> {
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

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    // -----------------------------------------------------------------------
    // Valid transitions
    // -----------------------------------------------------------------------

    #[test]
    fn active_to_accepted() {
        assert!(RequestStatus::Active.can_transition(RequestStatus::Accepted));
    }

    #[test]
    fn active_to_cancelled() {
        assert!(RequestStatus::Active.can_transition(RequestStatus::Cancelled));
    }

    #[test]
    fn accepted_to_fulfilled() {
        assert!(RequestStatus::Accepted.can_transition(RequestStatus::Fulfilled));
    }

    #[test]
    fn accepted_to_cancelled() {
        assert!(RequestStatus::Accepted.can_transition(RequestStatus::Cancelled));
    }

    // -----------------------------------------------------------------------
    // Terminal states have no outgoing transitions
    // -----------------------------------------------------------------------

    #[test]
    fn fulfilled_is_terminal() {
        assert!(RequestStatus::Fulfilled.valid_transitions().is_empty());
    }

    #[test]
    fn cancelled_is_terminal() {
        assert!(RequestStatus::Cancelled.valid_transitions().is_empty());
    }

    // -----------------------------------------------------------------------
    // Invalid transitions
    // -----------------------------------------------------------------------

    #[test]
    fn active_to_fulfilled_invalid() {
        assert!(!RequestStatus::Active.can_transition(RequestStatus::Fulfilled));
    }

    #[test]
    fn fulfilled_to_accepted_invalid() {
        assert_matches!(
            RequestStatus::Fulfilled.validate_transition(RequestStatus::Accepted),
            Err(CoreError::InvalidTransition { .. })
        );
    }

    #[test]
    fn cancelled_to_active_invalid() {
        // No reopen path exists.
        assert!(!RequestStatus::Cancelled.can_transition(RequestStatus::Active));
    }

    #[test]
    fn validate_transition_error_names_both_states() {
        let err = RequestStatus::Fulfilled
            .validate_transition(RequestStatus::Accepted)
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("fulfilled"));
        assert!(msg.contains("accepted"));
    }

    // -----------------------------------------------------------------------
    // Actor round trips
    // -----------------------------------------------------------------------

    #[test]
    fn actor_kind_round_trips() {
        for kind in [ActorKind::User, ActorKind::Ngo, ActorKind::BloodBank] {
            assert_eq!(ActorKind::parse(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn actor_kind_rejects_unknown() {
        assert!(ActorKind::parse("hospital").is_err());
    }
}
