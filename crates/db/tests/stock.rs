//! Integration tests for the blood stock ledger: the zero floor,
//! upsert-on-adjust, and absolute overwrites.

use sqlx::PgPool;

use lifelink_core::error::CoreError;
use lifelink_db::repositories::BloodStockRepo;
use lifelink_db::DbError;

async fn create_bank(pool: &PgPool, name: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO blood_banks (name, email) VALUES ($1, $2) RETURNING id")
        .bind(name)
        .bind(format!("{name}@example.org"))
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_adjust_below_zero_fails_and_preserves_count(pool: PgPool) {
    let bank_id = create_bank(&pool, "Floor Bank").await;
    BloodStockRepo::set(&pool, bank_id, "O+", 3).await.unwrap();

    let err = BloodStockRepo::adjust(&pool, bank_id, "O+", -5)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::InsufficientStock {
            available: 3,
            requested: 5
        })
    ));

    let stock = BloodStockRepo::find(&pool, bank_id, "O+")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stock.units_available, 3);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_adjust_to_exactly_zero_is_allowed(pool: PgPool) {
    let bank_id = create_bank(&pool, "Zero Bank").await;
    BloodStockRepo::set(&pool, bank_id, "A-", 4).await.unwrap();

    let units = BloodStockRepo::adjust(&pool, bank_id, "A-", -4).await.unwrap();
    assert_eq!(units, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_positive_adjust_creates_missing_row(pool: PgPool) {
    let bank_id = create_bank(&pool, "Fresh Bank").await;

    assert!(BloodStockRepo::find(&pool, bank_id, "AB-").await.unwrap().is_none());
    let units = BloodStockRepo::adjust(&pool, bank_id, "AB-", 6).await.unwrap();
    assert_eq!(units, 6);

    let units = BloodStockRepo::adjust(&pool, bank_id, "AB-", 2).await.unwrap();
    assert_eq!(units, 8);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_negative_adjust_on_missing_row_is_insufficient(pool: PgPool) {
    let bank_id = create_bank(&pool, "Empty Bank").await;

    let err = BloodStockRepo::adjust(&pool, bank_id, "B+", -1)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::InsufficientStock {
            available: 0,
            requested: 1
        })
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_set_rejects_negative_units(pool: PgPool) {
    let bank_id = create_bank(&pool, "Strict Bank").await;

    let err = BloodStockRepo::set(&pool, bank_id, "O-", -2).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::InvalidQuantity(-2))
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_set_overwrites_existing_count(pool: PgPool) {
    let bank_id = create_bank(&pool, "Correction Bank").await;
    BloodStockRepo::set(&pool, bank_id, "A+", 10).await.unwrap();

    let corrected = BloodStockRepo::set(&pool, bank_id, "A+", 2).await.unwrap();
    assert_eq!(corrected.units_available, 2);

    let listed = BloodStockRepo::list_for_bank(&pool, bank_id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].units_available, 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_concurrent_decrements_respect_floor(pool: PgPool) {
    let bank_id = create_bank(&pool, "Race Bank").await;
    BloodStockRepo::set(&pool, bank_id, "O+", 5).await.unwrap();

    let attempts: Vec<_> = (0..8)
        .map(|_| {
            let pool = pool.clone();
            tokio::spawn(async move { BloodStockRepo::adjust(&pool, bank_id, "O+", -1).await })
        })
        .collect();

    let results: Vec<_> = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 5, "only the available units may be consumed");

    let stock = BloodStockRepo::find(&pool, bank_id, "O+")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stock.units_available, 0);
}
