//! Repository for the `blood_stock` ledger.
//!
//! Adjustments are atomic read-modify-writes expressed in SQL; the
//! zero floor lives in the statement's WHERE clause so concurrent
//! decrements across server instances can never drive a count negative.

use sqlx::{PgPool, Postgres, Transaction};

use lifelink_core::error::CoreError;
use lifelink_core::types::DbId;

use crate::models::stock::BloodStock;
use crate::DbResult;

const STOCK_COLUMNS: &str = "id, blood_bank_id, blood_group, units_available, updated_at";

/// Atomic operations on the `blood_stock` table.
pub struct BloodStockRepo;

impl BloodStockRepo {
    /// Apply a relative adjustment, returning the new unit count.
    ///
    /// A negative delta that would drive the count below zero fails
    /// with [`CoreError::InsufficientStock`] and leaves the row
    /// unchanged. A non-negative delta against a missing (bank, group)
    /// row creates it.
    pub async fn adjust(
        pool: &PgPool,
        blood_bank_id: DbId,
        blood_group: &str,
        delta: i32,
    ) -> DbResult<i32> {
        if delta >= 0 {
            let units: i32 = sqlx::query_scalar(
                "INSERT INTO blood_stock (blood_bank_id, blood_group, units_available) \
                 VALUES ($1, $2, $3) \
                 ON CONFLICT (blood_bank_id, blood_group) DO UPDATE \
                 SET units_available = blood_stock.units_available + EXCLUDED.units_available, \
                     updated_at = NOW() \
                 RETURNING units_available",
            )
            .bind(blood_bank_id)
            .bind(blood_group)
            .bind(delta)
            .fetch_one(pool)
            .await?;
            return Ok(units);
        }

        let updated: Option<i32> = sqlx::query_scalar(
            "UPDATE blood_stock \
             SET units_available = units_available + $3, updated_at = NOW() \
             WHERE blood_bank_id = $1 AND blood_group = $2 \
               AND units_available + $3 >= 0 \
             RETURNING units_available",
        )
        .bind(blood_bank_id)
        .bind(blood_group)
        .bind(delta)
        .fetch_optional(pool)
        .await?;

        match updated {
            Some(units) => Ok(units),
            None => {
                tracing::debug!(
                    blood_bank_id,
                    blood_group,
                    delta,
                    "Stock floor guard rejected adjustment"
                );
                Err(Self::insufficient(pool, blood_bank_id, blood_group, delta).await?)
            }
        }
    }

    /// Transactional variant of [`Self::adjust`] for negative deltas
    /// issued during request fulfillment.
    pub async fn adjust_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        blood_bank_id: DbId,
        blood_group: &str,
        delta: i32,
    ) -> DbResult<i32> {
        let updated: Option<i32> = sqlx::query_scalar(
            "UPDATE blood_stock \
             SET units_available = units_available + $3, updated_at = NOW() \
             WHERE blood_bank_id = $1 AND blood_group = $2 \
               AND units_available + $3 >= 0 \
             RETURNING units_available",
        )
        .bind(blood_bank_id)
        .bind(blood_group)
        .bind(delta)
        .fetch_optional(&mut **tx)
        .await?;

        match updated {
            Some(units) => Ok(units),
            None => {
                // Re-read for the error detail; the caller rolls back.
                let available: Option<i32> = sqlx::query_scalar(
                    "SELECT units_available FROM blood_stock \
                     WHERE blood_bank_id = $1 AND blood_group = $2",
                )
                .bind(blood_bank_id)
                .bind(blood_group)
                .fetch_optional(&mut **tx)
                .await?;
                Err(CoreError::InsufficientStock {
                    available: available.unwrap_or(0),
                    requested: -delta,
                }
                .into())
            }
        }
    }

    /// Absolute overwrite for manual corrections.
    pub async fn set(
        pool: &PgPool,
        blood_bank_id: DbId,
        blood_group: &str,
        units: i32,
    ) -> DbResult<BloodStock> {
        if units < 0 {
            return Err(CoreError::InvalidQuantity(units).into());
        }
        let query = format!(
            "INSERT INTO blood_stock (blood_bank_id, blood_group, units_available) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (blood_bank_id, blood_group) DO UPDATE \
             SET units_available = EXCLUDED.units_available, updated_at = NOW() \
             RETURNING {STOCK_COLUMNS}"
        );
        let stock = sqlx::query_as::<_, BloodStock>(&query)
            .bind(blood_bank_id)
            .bind(blood_group)
            .bind(units)
            .fetch_one(pool)
            .await?;
        Ok(stock)
    }

    /// Find the stock row for a (bank, group) pair.
    pub async fn find(
        pool: &PgPool,
        blood_bank_id: DbId,
        blood_group: &str,
    ) -> Result<Option<BloodStock>, sqlx::Error> {
        let query = format!(
            "SELECT {STOCK_COLUMNS} FROM blood_stock \
             WHERE blood_bank_id = $1 AND blood_group = $2"
        );
        sqlx::query_as::<_, BloodStock>(&query)
            .bind(blood_bank_id)
            .bind(blood_group)
            .fetch_optional(pool)
            .await
    }

    /// List a bank's stock levels, grouped alphabetically.
    pub async fn list_for_bank(
        pool: &PgPool,
        blood_bank_id: DbId,
    ) -> Result<Vec<BloodStock>, sqlx::Error> {
        let query = format!(
            "SELECT {STOCK_COLUMNS} FROM blood_stock \
             WHERE blood_bank_id = $1 \
             ORDER BY blood_group"
        );
        sqlx::query_as::<_, BloodStock>(&query)
            .bind(blood_bank_id)
            .fetch_all(pool)
            .await
    }

    /// Build the typed insufficient-stock error from the current row.
    async fn insufficient(
        pool: &PgPool,
        blood_bank_id: DbId,
        blood_group: &str,
        delta: i32,
    ) -> Result<crate::DbError, sqlx::Error> {
        let available: Option<i32> = sqlx::query_scalar(
            "SELECT units_available FROM blood_stock \
             WHERE blood_bank_id = $1 AND blood_group = $2",
        )
        .bind(blood_bank_id)
        .bind(blood_group)
        .fetch_optional(pool)
        .await?;
        Ok(CoreError::InsufficientStock {
            available: available.unwrap_or(0),
            requested: -delta,
        }
        .into())
    }
}
