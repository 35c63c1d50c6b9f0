//! Integration tests for the blood request lifecycle: acceptance races,
//! fulfillment (with and without stock), cancellation audit, and the
//! dispatch log's insert-on-absence semantics.

use sqlx::PgPool;

use lifelink_core::error::CoreError;
use lifelink_core::request::Actor;
use lifelink_db::models::blood_request::{CancelBloodRequest, CreateBloodRequest};
use lifelink_db::repositories::{BloodRequestRepo, BloodStockRepo, DispatchLogRepo, DonationRepo};
use lifelink_db::DbError;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn create_bank(pool: &PgPool, name: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO blood_banks (name, email) VALUES ($1, $2) RETURNING id")
        .bind(name)
        .bind(format!("{name}@example.org"))
        .fetch_one(pool)
        .await
        .unwrap()
}

fn new_request(blood_group: &str, units: i32) -> CreateBloodRequest {
    CreateBloodRequest {
        requester_id: 1,
        requester_type: "user".to_string(),
        blood_group: blood_group.to_string(),
        units_needed: units,
        latitude: Some(12.9352),
        longitude: Some(77.6146),
        address: Some("Koramangala, Bengaluru".to_string()),
    }
}

// ---------------------------------------------------------------------------
// Test: create persists an active request
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_create_is_active(pool: PgPool) {
    let request = BloodRequestRepo::create(&pool, &new_request("B+", 2))
        .await
        .unwrap();
    assert_eq!(request.status, "active");
    assert!(request.accepted_by.is_none());
    assert!(request.accepted_at.is_none());
}

// ---------------------------------------------------------------------------
// Test: second accept loses and leaves acceptor fields unchanged
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_accept_race_has_one_winner(pool: PgPool) {
    let request = BloodRequestRepo::create(&pool, &new_request("A-", 1))
        .await
        .unwrap();

    let winner = BloodRequestRepo::accept(&pool, request.id, Actor::user(42))
        .await
        .unwrap();
    assert_eq!(winner.status, "accepted");
    assert_eq!(winner.accepted_by, Some(42));
    assert_eq!(winner.accepted_by_type.as_deref(), Some("user"));
    assert!(winner.accepted_at.is_some());

    let err = BloodRequestRepo::accept(&pool, request.id, Actor::user(43))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::AlreadyAccepted)));

    // The loser's attempt changed nothing.
    let current = BloodRequestRepo::find_by_id(&pool, request.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.accepted_by, Some(42));
    assert_eq!(current.accepted_at, winner.accepted_at);
}

// ---------------------------------------------------------------------------
// Test: accept after fulfill is an invalid transition
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_accept_after_fulfill_invalid(pool: PgPool) {
    let request = BloodRequestRepo::create(&pool, &new_request("O-", 1))
        .await
        .unwrap();
    BloodRequestRepo::accept(&pool, request.id, Actor::user(5))
        .await
        .unwrap();
    BloodRequestRepo::fulfill(&pool, request.id).await.unwrap();

    let err = BloodRequestRepo::accept(&pool, request.id, Actor::user(6))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::InvalidTransition { .. })
    ));
}

// ---------------------------------------------------------------------------
// Test: fulfill records a donation; user fulfiller leaves stock alone
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_fulfill_by_user_records_donation(pool: PgPool) {
    let request = BloodRequestRepo::create(&pool, &new_request("AB+", 2))
        .await
        .unwrap();
    BloodRequestRepo::accept(&pool, request.id, Actor::user(11))
        .await
        .unwrap();

    let (fulfilled, donation) = BloodRequestRepo::fulfill(&pool, request.id).await.unwrap();
    assert_eq!(fulfilled.status, "fulfilled");
    assert_eq!(donation.donor_id, 11);
    assert_eq!(donation.donor_type, "user");
    assert_eq!(donation.units, 2);
    assert_eq!(donation.source, "blood_request");
    assert_eq!(donation.request_id, Some(request.id));

    let donations = DonationRepo::list_for_request(&pool, request.id).await.unwrap();
    assert_eq!(donations.len(), 1);
}

// ---------------------------------------------------------------------------
// Test: blood-bank fulfillment consumes stock atomically
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_fulfill_by_bank_decrements_stock(pool: PgPool) {
    let bank_id = create_bank(&pool, "Stocked Bank").await;
    BloodStockRepo::set(&pool, bank_id, "B-", 5).await.unwrap();

    let request = BloodRequestRepo::create(&pool, &new_request("B-", 2))
        .await
        .unwrap();
    BloodRequestRepo::accept(&pool, request.id, Actor::blood_bank(bank_id))
        .await
        .unwrap();
    BloodRequestRepo::fulfill(&pool, request.id).await.unwrap();

    let stock = BloodStockRepo::find(&pool, bank_id, "B-")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stock.units_available, 3);
}

// ---------------------------------------------------------------------------
// Test: insufficient stock aborts fulfillment entirely
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_fulfill_rolls_back_on_insufficient_stock(pool: PgPool) {
    let bank_id = create_bank(&pool, "Thin Bank").await;
    BloodStockRepo::set(&pool, bank_id, "O+", 1).await.unwrap();

    let request = BloodRequestRepo::create(&pool, &new_request("O+", 3))
        .await
        .unwrap();
    BloodRequestRepo::accept(&pool, request.id, Actor::blood_bank(bank_id))
        .await
        .unwrap();

    let err = BloodRequestRepo::fulfill(&pool, request.id).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::InsufficientStock {
            available: 1,
            requested: 3
        })
    ));

    // The whole transaction rolled back: still accepted, stock intact,
    // no donation row.
    let current = BloodRequestRepo::find_by_id(&pool, request.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.status, "accepted");
    let stock = BloodStockRepo::find(&pool, bank_id, "O+")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stock.units_available, 1);
    assert!(DonationRepo::list_for_request(&pool, request.id)
        .await
        .unwrap()
        .is_empty());
}

// ---------------------------------------------------------------------------
// Test: cancellation audit trail
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_cancel_records_audit_fields(pool: PgPool) {
    let request = BloodRequestRepo::create(&pool, &new_request("A+", 1))
        .await
        .unwrap();

    let cancelled = BloodRequestRepo::cancel(
        &pool,
        request.id,
        &CancelBloodRequest {
            reason: "No longer needed".to_string(),
            cancelled_by_name: "Asha Rao".to_string(),
        },
    )
    .await
    .unwrap();

    assert_eq!(cancelled.status, "cancelled");
    assert_eq!(cancelled.cancel_reason.as_deref(), Some("No longer needed"));
    assert_eq!(
        cancelled.last_cancel_reason.as_deref(),
        Some("No longer needed")
    );
    assert_eq!(
        cancelled.last_cancelled_by_name.as_deref(),
        Some("Asha Rao")
    );

    // Terminal: a second cancel is rejected.
    let err = BloodRequestRepo::cancel(
        &pool,
        request.id,
        &CancelBloodRequest {
            reason: "again".to_string(),
            cancelled_by_name: "Asha Rao".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::InvalidTransition { .. })
    ));
}

// ---------------------------------------------------------------------------
// Test: cancel is legal from accepted as well
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_cancel_from_accepted(pool: PgPool) {
    let request = BloodRequestRepo::create(&pool, &new_request("A+", 1))
        .await
        .unwrap();
    BloodRequestRepo::accept(&pool, request.id, Actor::ngo(2))
        .await
        .unwrap();

    let cancelled = BloodRequestRepo::cancel(
        &pool,
        request.id,
        &CancelBloodRequest {
            reason: "Responder unavailable".to_string(),
            cancelled_by_name: "City NGO".to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!(cancelled.status, "cancelled");
    // The acceptance audit survives cancellation.
    assert_eq!(cancelled.accepted_by, Some(2));
}

// ---------------------------------------------------------------------------
// Test: dispatch log records each recipient once
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_dispatch_log_is_insert_on_absence(pool: PgPool) {
    let request = BloodRequestRepo::create(&pool, &new_request("O+", 1))
        .await
        .unwrap();

    let donor = Actor::user(10);
    assert!(DispatchLogRepo::record(&pool, request.id, donor).await.unwrap());
    // A repeat dispatch of the same recipient is a no-op.
    assert!(!DispatchLogRepo::record(&pool, request.id, donor).await.unwrap());
    // Same id, different kind, is a distinct recipient.
    assert!(DispatchLogRepo::record(&pool, request.id, Actor::blood_bank(10))
        .await
        .unwrap());

    assert!(DispatchLogRepo::mark_delivered(&pool, request.id, donor)
        .await
        .unwrap());

    let log = DispatchLogRepo::list_for_request(&pool, request.id)
        .await
        .unwrap();
    assert_eq!(log.len(), 2);
    assert!(log.iter().any(|n| n.recipient_type == "user" && n.delivered));
}

// ---------------------------------------------------------------------------
// Test: accepting a missing request is NotFound
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_accept_missing_request(pool: PgPool) {
    let err = BloodRequestRepo::accept(&pool, 12345, Actor::user(1))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::NotFound { .. })));
}
