//! # Database Store
//!
//! Database connection pool, readiness probe and the user repository.

// region: --- Modules
pub mod models;
pub mod user_repository;
// endregion: --- Modules

// region: --- Re-exports
pub use models::{User, UserForCreate, UserForUpdate};
pub use user_repository::UserRepository;
// endregion: --- Re-exports

// region: --- Types and Functions
use chrono::{DateTime, Utc};
use sqlx::{SqlitePool, sqlite::SqliteConnectOptions};

/// Type alias for SQLite connection pool.
pub type DbPool = SqlitePool;

/// Create a new SQLite connection pool for `database_url`, creating the file if missing.
pub async fn create_pool(database_url: &str) -> anyhow::Result<DbPool> {
    let options = database_url
        .parse::<SqliteConnectOptions>()?
        .create_if_missing(true);

    let pool = SqlitePool::connect_with(options).await?;

    Ok(pool)
}

/// Readiness probe: runs `SELECT 1` and returns the probe time when the database answers.
pub async fn check_ready(pool: &DbPool) -> Option<DateTime<Utc>> {
    match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await {
        Ok(_) => Some(lib_utils::now_utc()),
        Err(e) => {
            tracing::warn!(error = %e, "[HEALTH] Database readiness probe failed");
            None
        }
    }
}
// endregion: --- Types and Functions
