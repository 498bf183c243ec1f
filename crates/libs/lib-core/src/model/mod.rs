//! # Model Layer
//!
//! Persistence for user records.

pub mod store;
