//! Fan-out orchestration for newly created blood requests.
//!
//! Runs as a spawned task so the creating caller never blocks on
//! candidate selection or delivery, and a gateway failure never rolls
//! back the request. The flow: geo-rank donors and blood banks around
//! the request, dedup by identity, record each recipient in the
//! dispatch log (insert-on-absence), and hand only the newly recorded
//! set to the gateway.

use std::collections::HashMap;

use lifelink_core::dispatch::{dedup_candidates, Candidate, NotificationPayload, Recipient};
use lifelink_core::geo::{rank_within, GeoPoint};
use lifelink_core::request::ActorKind;
use lifelink_db::models::blood_request::BloodRequest;
use lifelink_db::models::responder::GeoResponder;
use lifelink_db::repositories::{DispatchLogRepo, ResponderRepo};

use crate::state::AppState;

/// Counts describing one dispatch run, for the log line.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub candidates: usize,
    pub notified: usize,
    pub skipped_already_recorded: usize,
    pub failed: usize,
}

/// Select, record and notify responders for a request.
///
/// Errors are logged, never propagated: dispatch is best-effort with
/// respect to the creation that triggered it.
pub async fn dispatch_request(state: AppState, request: BloodRequest) {
    match run(&state, &request).await {
        Ok(summary) => {
            tracing::info!(
                request_id = request.id,
                candidates = summary.candidates,
                notified = summary.notified,
                skipped = summary.skipped_already_recorded,
                failed = summary.failed,
                "Dispatch complete"
            );
        }
        Err(err) => {
            tracing::warn!(request_id = request.id, error = %err, "Dispatch failed");
        }
    }
}

async fn run(
    state: &AppState,
    request: &BloodRequest,
) -> Result<DispatchSummary, Box<dyn std::error::Error + Send + Sync>> {
    let (Some(lat), Some(lng)) = (request.latitude, request.longitude) else {
        tracing::info!(request_id = request.id, "Request has no location; skipping fan-out");
        return Ok(DispatchSummary::default());
    };
    let center = GeoPoint::new(lat, lng)?;
    let radius_km = state.config.dispatch_radius_km;

    let donors = ResponderRepo::geotagged_donors(&state.pool, &request.blood_group).await?;
    let banks = ResponderRepo::geotagged_blood_banks(&state.pool).await?;

    let mut candidates = rank_responders(center, radius_km, donors, ActorKind::User)?;
    candidates.extend(rank_responders(center, radius_km, banks, ActorKind::BloodBank)?);

    // The requester can surface as their own candidate (a donor asking
    // for their own group); never notify them about their own request.
    let requester = request.requester()?;
    let candidates: Vec<Candidate> = dedup_candidates(candidates)
        .into_iter()
        .filter(|candidate| candidate.actor != requester)
        .collect();

    let mut summary = DispatchSummary {
        candidates: candidates.len(),
        ..DispatchSummary::default()
    };

    // Record first, notify after: a recipient already present in the
    // log was covered by an earlier dispatch and is skipped.
    let mut recipients = Vec::new();
    for candidate in candidates {
        let Some(address) = candidate.address else {
            continue;
        };
        if DispatchLogRepo::record(&state.pool, request.id, candidate.actor).await? {
            recipients.push(Recipient {
                actor: candidate.actor,
                name: candidate.name,
                address,
            });
        } else {
            summary.skipped_already_recorded += 1;
        }
    }

    if recipients.is_empty() {
        return Ok(summary);
    }

    let payload = NotificationPayload {
        request_id: request.id,
        blood_group: request.blood_group.clone(),
        units_needed: request.units_needed,
        address: request.address.clone().unwrap_or_default(),
        message: format!(
            "Urgent: {} unit(s) of {} needed within {radius_km:.0} km",
            request.units_needed, request.blood_group
        ),
    };

    let outcomes = state.notifier.notify(&recipients, &payload).await;
    for outcome in outcomes {
        match outcome.result {
            Ok(()) => {
                DispatchLogRepo::mark_delivered(&state.pool, request.id, outcome.recipient.actor)
                    .await?;
                summary.notified += 1;
            }
            Err(reason) => {
                summary.failed += 1;
                tracing::warn!(
                    request_id = request.id,
                    recipient_id = outcome.recipient.actor.id,
                    recipient_kind = outcome.recipient.actor.kind.as_str(),
                    reason = %reason,
                    "Notification delivery failed"
                );
            }
        }
    }

    Ok(summary)
}

/// Rank one responder table's rows around the center, skipping rows
/// whose stored coordinates fail validation.
fn rank_responders(
    center: GeoPoint,
    radius_km: f64,
    responders: Vec<GeoResponder>,
    kind: ActorKind,
) -> Result<Vec<Candidate>, lifelink_core::error::CoreError> {
    let mut by_id: HashMap<i64, GeoResponder> = HashMap::with_capacity(responders.len());
    let mut points = Vec::with_capacity(responders.len());
    for responder in responders {
        match responder.point() {
            Ok(point) => {
                points.push((responder.id, point));
                by_id.insert(responder.id, responder);
            }
            Err(err) => {
                tracing::warn!(
                    responder_id = responder.id,
                    kind = kind.as_str(),
                    error = %err,
                    "Skipping responder with invalid stored coordinates"
                );
            }
        }
    }

    Ok(rank_within(center, radius_km, points)
        .into_iter()
        .filter_map(|ranked| {
            by_id
                .remove(&ranked.id)
                .map(|responder| responder.into_candidate(kind, ranked.distance_km))
        })
        .collect())
}
