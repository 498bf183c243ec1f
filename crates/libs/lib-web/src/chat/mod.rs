//! # Chat Module
//!
//! Real-time session and message-broadcast engine.
//!
//! Each WebSocket connection becomes a [`Session`] bound to one guest
//! [`Participant`](lib_core::dto::Participant). Accepted messages are broadcast
//! through the shared [`ParticipantRegistry`] and answered by the synthetic
//! responder after a fixed delay.

pub mod channel;
pub mod error;
pub mod identity;
pub mod registry;
pub mod responder;
pub mod session;
pub mod state;

pub use channel::{InboundStream, MessageChannel, Outbox, QueuedChannel, OUTBOX_CAPACITY};
pub use error::{ChatError, Result};
pub use identity::IdentityAllocator;
pub use registry::ParticipantRegistry;
pub use responder::{compose_reply, compose_reply_with, ReplyHandle, ResponderScheduler};
pub use session::{Session, SessionState, SessionStats};
pub use state::{ChatHub, ChatSettings, MessageIds};
