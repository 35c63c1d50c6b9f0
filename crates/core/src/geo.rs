//! Great-circle distance math and radius ranking for the geo index.
//!
//! Distances use the haversine formula on a spherical-earth
//! approximation, which is accurate to a few hundred meters at the
//! tens-of-kilometers radii used for dispatch. Flat Euclidean
//! degree-distance is deliberately not used: longitude degrees compress
//! with latitude and would bias candidate density at high latitudes.

use crate::error::CoreError;
use crate::types::DbId;

/// Mean earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A validated WGS84 coordinate pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Build a point, rejecting out-of-range coordinates.
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoreError> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(CoreError::InvalidCoordinate { lat, lng });
        }
        Ok(Self { lat, lng })
    }
}

/// Great-circle distance between two points in kilometers.
pub fn distance_km(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// A candidate row with its computed distance from the query center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked {
    pub id: DbId,
    pub distance_km: f64,
}

/// Filter geotagged rows to those within `radius_km` of `center`,
/// ordered by ascending distance with ties broken by id.
///
/// Rows lacking coordinates must be excluded by the caller before this
/// point (the repository only selects rows with non-null lat/lng).
pub fn rank_within(
    center: GeoPoint,
    radius_km: f64,
    records: impl IntoIterator<Item = (DbId, GeoPoint)>,
) -> Vec<Ranked> {
    let mut ranked: Vec<Ranked> = records
        .into_iter()
        .map(|(id, point)| Ranked {
            id,
            distance_km: distance_km(center, point),
        })
        .filter(|r| r.distance_km <= radius_km)
        .collect();

    ranked.sort_by(|a, b| {
        a.distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.id.cmp(&b.id))
    });
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn point(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).unwrap()
    }

    // -----------------------------------------------------------------------
    // Coordinate validation
    // -----------------------------------------------------------------------

    #[test]
    fn rejects_latitude_out_of_range() {
        assert_matches!(
            GeoPoint::new(91.0, 0.0),
            Err(crate::error::CoreError::InvalidCoordinate { .. })
        );
        assert_matches!(
            GeoPoint::new(-90.5, 0.0),
            Err(crate::error::CoreError::InvalidCoordinate { .. })
        );
    }

    #[test]
    fn rejects_longitude_out_of_range() {
        assert_matches!(
            GeoPoint::new(0.0, 180.5),
            Err(crate::error::CoreError::InvalidCoordinate { .. })
        );
    }

    #[test]
    fn accepts_boundary_coordinates() {
        assert!(GeoPoint::new(90.0, 180.0).is_ok());
        assert!(GeoPoint::new(-90.0, -180.0).is_ok());
    }

    // -----------------------------------------------------------------------
    // Haversine distance
    // -----------------------------------------------------------------------

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = distance_km(point(0.0, 0.0), point(1.0, 0.0));
        assert!((d - 111.2).abs() < 1.0, "got {d}");
    }

    #[test]
    fn zero_distance_for_identical_points() {
        let p = point(12.9716, 77.5946);
        assert_eq!(distance_km(p, p), 0.0);
    }

    #[test]
    fn bengaluru_pair_is_roughly_four_point_six_km() {
        // A donor in central Bengaluru and a request a few km southeast.
        let d = distance_km(point(12.9716, 77.5946), point(12.9352, 77.6146));
        assert!((d - 4.6).abs() < 0.3, "got {d}");
    }

    // -----------------------------------------------------------------------
    // Radius ranking
    // -----------------------------------------------------------------------

    #[test]
    fn includes_nearby_donor_at_dispatch_radius() {
        let center = point(12.9352, 77.6146);
        let donor = (1, point(12.9716, 77.5946));
        assert_eq!(rank_within(center, 35.0, [donor]).len(), 1);
    }

    #[test]
    fn excludes_donor_outside_tight_radius() {
        let center = point(12.9352, 77.6146);
        let donor = (1, point(12.9716, 77.5946));
        assert!(rank_within(center, 1.0, [donor]).is_empty());
    }

    #[test]
    fn orders_by_distance_then_id() {
        let center = point(0.0, 0.0);
        let records = vec![
            (3, point(0.2, 0.0)),
            (2, point(0.1, 0.0)),
            // Same distance as id 2, placed after it by the id tiebreak.
            (1, point(-0.1, 0.0)),
        ];
        let ranked = rank_within(center, 100.0, records);
        let ids: Vec<_> = ranked.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn boundary_distance_is_included() {
        let center = point(0.0, 0.0);
        let d = distance_km(center, point(0.1, 0.0));
        let ranked = rank_within(center, d, [(7, point(0.1, 0.0))]);
        assert_eq!(ranked.len(), 1);
    }
}
