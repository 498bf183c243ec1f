//! # Chat Errors
//!
//! Faults of the real-time engine. Every variant is scoped to a single session;
//! none of them is fatal to the process.

use lib_core::dto::ParticipantId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChatError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// Inbound content was empty after trimming, too long, or not parseable.
    /// Dropped silently by the session.
    #[error("Invalid message: {0}")]
    Validation(String),

    /// Registration found the id already present. Fails connection setup.
    #[error("Participant {0} is already registered")]
    DuplicateParticipant(ParticipantId),

    /// Send on a closed channel. Logged and swallowed by callers.
    #[error("Channel is closed")]
    ChannelClosed,

    /// Targeted delivery to an id that is not in the registry.
    #[error("Participant {0} is not registered")]
    UnknownParticipant(ParticipantId),

    /// Operation on a session that already reached `Closed`.
    #[error("Session is closed")]
    SessionClosed,
}
