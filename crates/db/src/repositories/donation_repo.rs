//! Repository for the `donations` table. Donations are append-only.

use sqlx::{PgPool, Postgres, Transaction};

use lifelink_core::types::DbId;

use crate::models::donation::{CreateDonation, Donation};

const DONATION_COLUMNS: &str = "\
    id, donor_id, donor_type, request_id, blood_group, units, source, \
    appointment_id, donated_at";

/// Append and read operations for the `donations` table.
pub struct DonationRepo;

impl DonationRepo {
    /// Record a donation.
    pub async fn create(pool: &PgPool, input: &CreateDonation) -> Result<Donation, sqlx::Error> {
        sqlx::query_as::<_, Donation>(&Self::insert_query())
            .bind(input.donor_id)
            .bind(&input.donor_type)
            .bind(input.request_id)
            .bind(&input.blood_group)
            .bind(input.units)
            .bind(&input.source)
            .bind(input.appointment_id)
            .fetch_one(pool)
            .await
    }

    /// Record a donation inside an open transaction (request
    /// fulfillment, appointment completion).
    pub async fn create_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        input: &CreateDonation,
    ) -> Result<Donation, sqlx::Error> {
        sqlx::query_as::<_, Donation>(&Self::insert_query())
            .bind(input.donor_id)
            .bind(&input.donor_type)
            .bind(input.request_id)
            .bind(&input.blood_group)
            .bind(input.units)
            .bind(&input.source)
            .bind(input.appointment_id)
            .fetch_one(&mut **tx)
            .await
    }

    /// List a donor's donations, newest first.
    pub async fn list_for_donor(
        pool: &PgPool,
        donor_id: DbId,
        donor_type: &str,
    ) -> Result<Vec<Donation>, sqlx::Error> {
        let query = format!(
            "SELECT {DONATION_COLUMNS} FROM donations \
             WHERE donor_id = $1 AND donor_type = $2 \
             ORDER BY donated_at DESC, id DESC"
        );
        sqlx::query_as::<_, Donation>(&query)
            .bind(donor_id)
            .bind(donor_type)
            .fetch_all(pool)
            .await
    }

    /// List the donations backing a request.
    pub async fn list_for_request(
        pool: &PgPool,
        request_id: DbId,
    ) -> Result<Vec<Donation>, sqlx::Error> {
        let query = format!(
            "SELECT {DONATION_COLUMNS} FROM donations \
             WHERE request_id = $1 \
             ORDER BY donated_at ASC, id ASC"
        );
        sqlx::query_as::<_, Donation>(&query)
            .bind(request_id)
            .fetch_all(pool)
            .await
    }

    fn insert_query() -> String {
        format!(
            "INSERT INTO donations \
             (donor_id, donor_type, request_id, blood_group, units, source, appointment_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {DONATION_COLUMNS}"
        )
    }
}
