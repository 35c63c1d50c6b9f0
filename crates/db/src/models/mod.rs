//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts

pub mod appointment;
pub mod blood_request;
pub mod donation;
pub mod responder;
pub mod slot;
pub mod stock;
