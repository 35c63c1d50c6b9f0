//! Domain logic for the Lifelink dispatch and booking engine.
//!
//! This crate has zero internal dependencies so it can be used by the
//! repository layer, the API server, and any future worker or CLI tooling.
//! It holds the typed error taxonomy, geo math, the request/appointment
//! state machines, slot materialization planning, and the fan-out
//! candidate dedup plus the [`dispatch::NotificationGateway`] seam.

pub mod appointment;
pub mod blood;
pub mod dispatch;
pub mod error;
pub mod geo;
pub mod request;
pub mod types;
