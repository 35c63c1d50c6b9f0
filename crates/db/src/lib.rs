//! Persistence layer for Lifelink.
//!
//! Models mirror the database rows; repositories are zero-sized structs
//! whose async methods take `&PgPool` as the first argument. Every
//! cross-cutting mutation (request acceptance, slot booking and
//! cancellation, stock adjustment) is a single conditional statement
//! whose rows-affected count distinguishes success from a lost race,
//! never a read-then-write in application code, so the guards hold
//! across multiple server instances.

use sqlx::postgres::PgPoolOptions;

use lifelink_core::error::CoreError;

pub mod models;
pub mod repositories;

pub type DbPool = sqlx::PgPool;

/// Error type for repository operations that can fail on either the
/// database or a domain guard (lost race, exhausted stock, ...).
///
/// Plain CRUD methods return `sqlx::Error` directly, matching their
/// single failure mode; the guarded operations return this.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Domain(#[from] CoreError),
}

pub type DbResult<T> = Result<T, DbError>;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from the workspace `migrations/` directory.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}
