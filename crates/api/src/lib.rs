//! Lifelink API server library.
//!
//! Exposes the building blocks (config, state, error handling, router,
//! dispatch orchestration) so integration tests and the binary
//! entrypoint can both access them.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod notifier;
pub mod response;
pub mod router;
pub mod state;
