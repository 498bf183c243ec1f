//! # Health Data Transfer Objects
//!
//! Payload of `GET /api/health`.

use serde::{Deserialize, Serialize};

/// Readiness report for the service and its database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `"healthy"` or `"unhealthy"`
    pub status: String,
    /// `"connected"` or `"disconnected"`
    pub database: String,
    /// RFC3339 time the probe ran
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy(timestamp: String) -> Self {
        Self {
            status: "healthy".to_string(),
            database: "connected".to_string(),
            timestamp,
        }
    }

    pub fn unhealthy(timestamp: String) -> Self {
        Self {
            status: "unhealthy".to_string(),
            database: "disconnected".to_string(),
            timestamp,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
