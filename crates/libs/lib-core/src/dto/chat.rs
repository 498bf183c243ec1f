//! # Chat Data Transfer Objects
//!
//! Wire shapes for the real-time chat connection.
//!
//! Outbound frames (server → client) are serialized [`ChatMessage`] values:
//!
//! ```json
//! {
//!   "id": 42,
//!   "senderId": "6f1c0c7e-...",
//!   "sender": "Guest417",
//!   "content": "Hello",
//!   "timestamp": "2024-01-01T12:00:00.000Z",
//!   "isSynthetic": false
//! }
//! ```
//!
//! Inbound frames (client → server) are [`InboundMessage`] values: `{ "content": "Hello" }`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identifier of a connected participant, stable for the connection's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(Uuid);

impl ParticipantId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The reserved identifier of the synthetic responder.
    pub const fn synthetic() -> Self {
        Self(Uuid::nil())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ParticipantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A chat participant: a human guest or the synthetic responder.
///
/// The display name is assigned once at connect time and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: ParticipantId,
    pub display_name: String,
    pub is_synthetic: bool,
}

impl Participant {
    /// Create a human participant with a fresh id.
    pub fn human(display_name: impl Into<String>) -> Self {
        Self {
            id: ParticipantId::new(),
            display_name: display_name.into(),
            is_synthetic: false,
        }
    }

    /// Create the synthetic responder identity.
    pub fn synthetic(display_name: impl Into<String>) -> Self {
        Self {
            id: ParticipantId::synthetic(),
            display_name: display_name.into(),
            is_synthetic: true,
        }
    }
}

/// A chat message as delivered to clients. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Process-unique, monotonically increasing id
    pub id: u64,
    /// Id of the authoring participant
    pub sender_id: ParticipantId,
    /// Display name of the authoring participant
    pub sender: String,
    /// Trimmed, non-empty text
    pub content: String,
    /// Creation time, RFC 3339 with millisecond precision on the wire
    #[serde(with = "wire_time")]
    pub timestamp: DateTime<Utc>,
    /// Whether the synthetic responder authored it
    pub is_synthetic: bool,
}

impl ChatMessage {
    /// Create a message authored by `sender`, stamped with the current time.
    pub fn new(id: u64, sender: &Participant, content: impl Into<String>) -> Self {
        Self {
            id,
            sender_id: sender.id,
            sender: sender.display_name.clone(),
            content: content.into(),
            timestamp: lib_utils::now_utc(),
            is_synthetic: sender.is_synthetic,
        }
    }
}

/// Timestamps travel in the same millisecond RFC 3339 form as the rest of the API.
mod wire_time {
    use chrono::{DateTime, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&lib_utils::format_time(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        lib_utils::parse_utc(&raw).map_err(D::Error::custom)
    }
}

/// A message sent by a client. `content` is trimmed and validated before use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub content: String,
}

impl InboundMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into() }
    }
}
