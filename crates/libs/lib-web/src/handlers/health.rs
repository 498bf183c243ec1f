//! # Health Handlers
//!
//! Liveness and readiness endpoints.
//!
//! ## Endpoints
//!
//! - `GET /` - Plain-text liveness banner
//! - `GET /api/health` - Database readiness probe

use axum::{extract::State, http::StatusCode, Json};
use lib_core::dto::HealthResponse;
use lib_core::{check_ready, DbPool};
use lib_utils::{format_time, now_utc};
use tracing::warn;

/// Banner returned by `GET /`.
pub const ROOT_BANNER: &str = "ChatGenius Server Running";

/// **Route**: `GET /`
pub async fn root() -> &'static str {
    ROOT_BANNER
}

/// Report whether the database answers.
///
/// **Route**: `GET /api/health`
///
/// # Returns
///
/// Success (200):
/// ```json
/// { "status": "healthy", "database": "connected", "timestamp": "2024-01-01T12:00:00.000Z" }
/// ```
///
/// Error (503): same shape with `"unhealthy"` / `"disconnected"`.
pub async fn health(State(pool): State<DbPool>) -> (StatusCode, Json<HealthResponse>) {
    match check_ready(&pool).await {
        Some(checked_at) => (StatusCode::OK, Json(HealthResponse::healthy(format_time(checked_at)))),
        None => {
            warn!("[HEALTH] Reporting unhealthy");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse::unhealthy(format_time(now_utc()))),
            )
        }
    }
}
