//! # Chat Hub
//!
//! Process-wide chat state shared by every session: the participant registry,
//! the identity allocator, the responder scheduler, the message id counter and
//! the shutdown signal.

use super::identity::{IdentityAllocator, DEFAULT_GUEST_RANGE, GUEST_PREFIX};
use super::registry::ParticipantRegistry;
use super::responder::{ResponderScheduler, DEFAULT_REPLY_DELAY};
use lib_core::dto::Participant;
use lib_core::Config;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

/// Monotonic message id source. Ids start at 1 and never repeat.
#[derive(Debug)]
pub struct MessageIds(AtomicU64);

impl MessageIds {
    pub fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for MessageIds {
    fn default() -> Self {
        Self::new()
    }
}

/// Tunables of the chat engine.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub reply_delay: Duration,
    pub guest_name_range: u32,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            reply_delay: DEFAULT_REPLY_DELAY,
            guest_name_range: DEFAULT_GUEST_RANGE,
        }
    }
}

impl From<&Config> for ChatSettings {
    fn from(config: &Config) -> Self {
        Self {
            reply_delay: config.responder_delay(),
            guest_name_range: config.guest_name_range,
        }
    }
}

pub struct ChatHub {
    registry: ParticipantRegistry,
    identities: IdentityAllocator,
    scheduler: ResponderScheduler,
    message_ids: Arc<MessageIds>,
    shutdown_tx: watch::Sender<bool>,
}

impl ChatHub {
    pub fn new(settings: ChatSettings) -> Self {
        let message_ids = Arc::new(MessageIds::new());
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            registry: ParticipantRegistry::new(),
            identities: IdentityAllocator::new(GUEST_PREFIX, settings.guest_name_range),
            scheduler: ResponderScheduler::new(settings.reply_delay, Arc::clone(&message_ids)),
            message_ids,
            shutdown_tx,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(ChatSettings::from(config))
    }

    pub fn registry(&self) -> &ParticipantRegistry {
        &self.registry
    }

    pub fn identities(&self) -> &IdentityAllocator {
        &self.identities
    }

    pub fn scheduler(&self) -> &ResponderScheduler {
        &self.scheduler
    }

    pub fn responder(&self) -> &Participant {
        self.scheduler.responder()
    }

    pub fn next_message_id(&self) -> u64 {
        self.message_ids.next()
    }

    /// Ask every live session to close. New connections are refused afterwards.
    pub fn shutdown(&self) {
        if !self.shutdown_tx.send_replace(true) {
            info!(
                receivers = self.shutdown_tx.receiver_count(),
                "[CHAT] Shutdown signalled to live sessions"
            );
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// The responder followed by every connected participant.
    pub async fn participants(&self) -> Vec<Participant> {
        let mut participants = vec![self.responder().clone()];
        participants.extend(self.registry.list().await);
        participants
    }
}

impl Default for ChatHub {
    fn default() -> Self {
        Self::new(ChatSettings::default())
    }
}
