use std::sync::Arc;

use lifelink_core::dispatch::NotificationGateway;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: lifelink_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Notification delivery collaborator for request fan-out.
    pub notifier: Arc<dyn NotificationGateway>,
}
