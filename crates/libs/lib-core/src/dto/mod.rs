//! # Data Transfer Objects (DTOs)
//!
//! Data structures exchanged with browser clients over the WebSocket and REST API.

pub mod chat;
pub mod health;

pub use chat::*;
pub use health::*;
