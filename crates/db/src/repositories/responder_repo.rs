//! Read-only queries over the geotagged responder tables.
//!
//! These feed the dispatch fan-out: only rows with both coordinates set
//! are returned, so a record lacking a location is excluded from the
//! candidate set rather than ranked at distance zero.

use sqlx::PgPool;

use crate::models::responder::GeoResponder;

const RESPONDER_COLUMNS: &str = "id, name, email, latitude, longitude";

/// Geotagged reads over `donors`, `ngos`, and `blood_banks`.
pub struct ResponderRepo;

impl ResponderRepo {
    /// Donors of a given blood group that have coordinates.
    pub async fn geotagged_donors(
        pool: &PgPool,
        blood_group: &str,
    ) -> Result<Vec<GeoResponder>, sqlx::Error> {
        let query = format!(
            "SELECT {RESPONDER_COLUMNS} FROM donors \
             WHERE blood_group = $1 \
               AND latitude IS NOT NULL AND longitude IS NOT NULL \
             ORDER BY id"
        );
        sqlx::query_as::<_, GeoResponder>(&query)
            .bind(blood_group)
            .fetch_all(pool)
            .await
    }

    /// Blood banks that have coordinates.
    pub async fn geotagged_blood_banks(pool: &PgPool) -> Result<Vec<GeoResponder>, sqlx::Error> {
        let query = format!(
            "SELECT {RESPONDER_COLUMNS} FROM blood_banks \
             WHERE latitude IS NOT NULL AND longitude IS NOT NULL \
             ORDER BY id"
        );
        sqlx::query_as::<_, GeoResponder>(&query)
            .fetch_all(pool)
            .await
    }

    /// NGOs that have coordinates.
    pub async fn geotagged_ngos(pool: &PgPool) -> Result<Vec<GeoResponder>, sqlx::Error> {
        let query = format!(
            "SELECT {RESPONDER_COLUMNS} FROM ngos \
             WHERE latitude IS NOT NULL AND longitude IS NOT NULL \
             ORDER BY id"
        );
        sqlx::query_as::<_, GeoResponder>(&query)
            .fetch_all(pool)
            .await
    }
}
