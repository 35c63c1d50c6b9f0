//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Plain CRUD returns
//! `sqlx::Error`; operations with a domain guard (acceptance races,
//! booking capacity, stock floor) return [`crate::DbError`].

pub mod appointment_repo;
pub mod blood_request_repo;
pub mod dispatch_repo;
pub mod donation_repo;
pub mod responder_repo;
pub mod slot_repo;
pub mod stock_repo;

pub use appointment_repo::AppointmentRepo;
pub use blood_request_repo::BloodRequestRepo;
pub use dispatch_repo::DispatchLogRepo;
pub use donation_repo::DonationRepo;
pub use responder_repo::ResponderRepo;
pub use slot_repo::{AppointmentSlotRepo, DefaultSlotRepo};
pub use stock_repo::BloodStockRepo;
