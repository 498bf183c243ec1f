//! # Participant Handlers
//!
//! - `GET /api/participants` - Who is in the chat room right now

use crate::chat::ChatHub;
use axum::{extract::State, Json};
use lib_core::dto::Participant;
use std::sync::Arc;

/// List connected participants, the synthetic responder first.
///
/// **Route**: `GET /api/participants`
///
/// ```json
/// [
///   { "id": "00000000-0000-0000-0000-000000000000", "displayName": "AI Assistant", "isSynthetic": true },
///   { "id": "6f1c0c7e-...", "displayName": "Guest417", "isSynthetic": false }
/// ]
/// ```
pub async fn list_participants(State(hub): State<Arc<ChatHub>>) -> Json<Vec<Participant>> {
    Json(hub.participants().await)
}
