//! Fan-out candidate selection and the notification gateway seam.
//!
//! A single request creation can surface the same responder through
//! more than one query (a blood bank that is both "nearby" and
//! "matching blood group"); [`dedup_candidates`] collapses those to one
//! notification per identity before the list is handed to the gateway.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::request::Actor;
use crate::types::DbId;

/// Fan-out radius for "urgent nearby" dispatch, in kilometers.
/// Overridable via `DISPATCH_RADIUS_KM` in the server configuration.
pub const DEFAULT_DISPATCH_RADIUS_KM: f64 = 35.0;

// ---------------------------------------------------------------------------
// Candidates
// ---------------------------------------------------------------------------

/// A responder selected by the geo queries, prior to dedup.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub actor: Actor,
    pub name: String,
    /// Delivery address (email for now); `None` means the responder
    /// cannot be reached and is dropped from the notify list.
    pub address: Option<String>,
    pub distance_km: f64,
}

/// Collapse candidates to one entry per (kind, id), keeping the nearest
/// sighting of each, ordered by ascending distance with ties broken by
/// actor identity for determinism.
pub fn dedup_candidates(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut best: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match best.iter_mut().find(|c| c.actor == candidate.actor) {
            Some(existing) => {
                if candidate.distance_km < existing.distance_km {
                    *existing = candidate;
                }
            }
            None => best.push(candidate),
        }
    }

    best.sort_by(|a, b| {
        a.distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then((a.actor.kind, a.actor.id).cmp(&(b.actor.kind, b.actor.id)))
    });
    best
}

// ---------------------------------------------------------------------------
// Notification gateway
// ---------------------------------------------------------------------------

/// A deliverable recipient from the deduplicated candidate list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    pub actor: Actor,
    pub name: String,
    pub address: String,
}

/// The message handed to the gateway, one payload per dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub request_id: DbId,
    pub blood_group: String,
    pub units_needed: i32,
    pub address: String,
    pub message: String,
}

/// Per-recipient delivery result reported by the gateway.
#[derive(Debug, Clone)]
pub struct DeliveryOutcome {
    pub recipient: Recipient,
    pub result: Result<(), String>,
}

/// External delivery collaborator. Implementations attempt delivery
/// exactly once per recipient; failures are reported in the outcome
/// list and are never retried by the core.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn notify(
        &self,
        recipients: &[Recipient],
        payload: &NotificationPayload,
    ) -> Vec<DeliveryOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Actor;

    fn candidate(actor: Actor, distance_km: f64) -> Candidate {
        Candidate {
            actor,
            name: format!("responder-{}", actor.id),
            address: Some(format!("responder-{}@example.org", actor.id)),
            distance_km,
        }
    }

    #[test]
    fn keeps_nearest_sighting_of_duplicate() {
        let bank = Actor::blood_bank(4);
        let deduped = dedup_candidates(vec![candidate(bank, 12.0), candidate(bank, 3.5)]);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].distance_km, 3.5);
    }

    #[test]
    fn same_id_different_kind_are_distinct() {
        let deduped = dedup_candidates(vec![
            candidate(Actor::user(9), 1.0),
            candidate(Actor::blood_bank(9), 2.0),
        ]);
        assert_eq!(deduped.len(), 2);
    }

    #[test]
    fn ordered_by_distance() {
        let deduped = dedup_candidates(vec![
            candidate(Actor::user(1), 20.0),
            candidate(Actor::user(2), 5.0),
            candidate(Actor::blood_bank(3), 10.0),
        ]);
        let ids: Vec<_> = deduped.iter().map(|c| c.actor.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(dedup_candidates(Vec::new()).is_empty());
    }
}
