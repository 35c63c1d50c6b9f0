//! Geotagged responder rows backing the geo index.
//!
//! Only rows with non-null coordinates are candidates for dispatch;
//! the repositories exclude the rest at query time rather than treating
//! a missing coordinate as distance zero.

use serde::Serialize;
use sqlx::FromRow;

use lifelink_core::dispatch::Candidate;
use lifelink_core::error::CoreError;
use lifelink_core::geo::GeoPoint;
use lifelink_core::request::{Actor, ActorKind};
use lifelink_core::types::DbId;

/// A geotagged responder row (donor, NGO, or blood bank), as selected
/// for dispatch candidate ranking.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GeoResponder {
    pub id: DbId,
    pub name: String,
    pub email: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoResponder {
    /// The row's coordinates as a validated point.
    pub fn point(&self) -> Result<GeoPoint, CoreError> {
        GeoPoint::new(self.latitude, self.longitude)
    }

    /// Turn this row into a dispatch candidate of the given kind.
    pub fn into_candidate(self, kind: ActorKind, distance_km: f64) -> Candidate {
        Candidate {
            actor: Actor { kind, id: self.id },
            name: self.name,
            address: self.email,
            distance_km,
        }
    }
}
