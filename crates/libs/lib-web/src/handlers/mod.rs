//! # HTTP Request Handlers
//!
//! Axum handlers, one module per feature area.
//!
//! - **[`health`]**: `GET /`, `GET /api/health`
//! - **[`participants`]**: `GET /api/participants`
//! - **[`websocket`]**: `GET /api/ws/chat`

pub mod health;
pub mod participants;
pub mod websocket;
