use crate::types::DbId;

/// Domain error taxonomy for the dispatch and booking engine.
///
/// Every variant is reported synchronously to the caller as a typed
/// failure; nothing here is retried automatically. Lost races
/// ([`AlreadyAccepted`](CoreError::AlreadyAccepted),
/// [`SlotFull`](CoreError::SlotFull)) are resolved by the caller
/// re-querying current state and deciding whether to try again.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid coordinate: lat {lat}, lng {lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("Invalid request transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Request already accepted by another responder")]
    AlreadyAccepted,

    #[error("Slot is fully booked")]
    SlotFull,

    #[error("Insufficient stock: {available} unit(s) available, {requested} requested")]
    InsufficientStock { available: i32, requested: i32 },

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i32),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}
