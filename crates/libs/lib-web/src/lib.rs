//! # Web Library
//!
//! The real-time chat engine plus its HTTP and WebSocket surface.
//!
//! - [`chat`]: sessions, participant registry, delayed responder
//! - [`handlers`]: Axum handlers
//! - [`middleware`]: request stamping and logging
//! - [`server`]: router construction and server startup

pub mod chat;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use server::{create_router, start_server, AppState, ServerConfig};
