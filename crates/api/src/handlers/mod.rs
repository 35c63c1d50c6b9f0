//! HTTP handlers, one module per resource.

pub mod appointments;
pub mod health;
pub mod requests;
pub mod slots;
pub mod stock;
