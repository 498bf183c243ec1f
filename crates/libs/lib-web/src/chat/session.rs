//! # Session Orchestrator
//!
//! One [`Session`] per connection. It owns the connection's outbound channel,
//! its registry entry and its pending replies.
//!
//! ```text
//! Connecting ──register──▶ Active ──close / disconnect / shutdown──▶ Closed
//!                            │ ▲
//!                            └─┘ inbound message
//! ```
//!
//! - `Connecting -> Active`: the participant is registered and gets a welcome
//!   message from the responder. Nobody else sees it.
//! - `Active -> Active`: inbound content is trimmed and validated. Empty or
//!   oversized content is dropped silently. Accepted content is broadcast to
//!   every participant (the sender included) and a reply is scheduled.
//! - `Active -> Closed`: pending replies are cancelled, the registry entry is
//!   removed and the channel is closed. Closing twice is a no-op.

use super::channel::{InboundStream, MessageChannel};
use super::error::{ChatError, Result};
use super::responder::{ReplyHandle, WELCOME_MESSAGE};
use super::state::ChatHub;
use futures_util::StreamExt;
use lib_core::dto::{ChatMessage, InboundMessage, Participant, ParticipantId};
use lib_utils::{validate_max_length, validate_not_empty};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Longest accepted message, in characters, after trimming.
pub const MAX_CONTENT_LENGTH: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Active,
    Closed,
}

/// Per-session counters, reported when the session closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub messages_received: u64,
    pub messages_accepted: u64,
    pub messages_rejected: u64,
    pub replies_delivered: u64,
    pub replies_dropped: u64,
}

/// Resolve once the hub signals shutdown.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|closing| *closing).await;
}

/// Trim `raw` and check it is worth broadcasting.
pub fn validate_content(raw: &str) -> Result<&str> {
    let content = raw.trim();
    validate_not_empty(content, "Message").map_err(ChatError::Validation)?;
    validate_max_length(content, MAX_CONTENT_LENGTH, "Message").map_err(ChatError::Validation)?;
    Ok(content)
}

pub struct Session {
    hub: Arc<ChatHub>,
    participant: Participant,
    channel: Arc<dyn MessageChannel>,
    state: SessionState,
    pending: Vec<ReplyHandle>,
    replies_tx: mpsc::UnboundedSender<ChatMessage>,
    replies_rx: mpsc::UnboundedReceiver<ChatMessage>,
    shutdown: watch::Receiver<bool>,
    stats: SessionStats,
    started_at: Instant,
}

impl Session {
    /// Open a session for a new guest with a freshly allocated identity.
    pub async fn connect(hub: Arc<ChatHub>, channel: Arc<dyn MessageChannel>) -> Result<Self> {
        let participant = hub.identities().allocate_participant();
        Self::connect_as(hub, participant, channel).await
    }

    /// Open a session for `participant`.
    ///
    /// # Errors
    ///
    /// - [`ChatError::DuplicateParticipant`] if the id is already connected
    /// - [`ChatError::SessionClosed`] if the hub is shutting down
    ///
    /// On error the channel is closed.
    pub async fn connect_as(
        hub: Arc<ChatHub>,
        participant: Participant,
        channel: Arc<dyn MessageChannel>,
    ) -> Result<Self> {
        if hub.is_shutting_down() {
            channel.close();
            return Err(ChatError::SessionClosed);
        }

        if let Err(e) = hub.registry().add(participant.clone(), Arc::clone(&channel)).await {
            warn!(
                participant_id = %participant.id,
                error = %e,
                "[CHAT] Connection setup failed"
            );
            channel.close();
            return Err(e);
        }

        let (replies_tx, replies_rx) = mpsc::unbounded_channel();
        let shutdown = hub.subscribe_shutdown();
        let mut session = Self {
            hub,
            participant,
            channel,
            state: SessionState::Connecting,
            pending: Vec::new(),
            replies_tx,
            replies_rx,
            shutdown,
            stats: SessionStats::default(),
            started_at: Instant::now(),
        };

        session.activate();
        Ok(session)
    }

    fn activate(&mut self) {
        let welcome = ChatMessage::new(
            self.hub.next_message_id(),
            self.hub.responder(),
            WELCOME_MESSAGE,
        );

        if let Err(e) = self.channel.send(&welcome) {
            warn!(participant_id = %self.participant.id, error = %e, "[CHAT] Welcome not delivered");
        }

        self.state = SessionState::Active;
        info!(
            participant_id = %self.participant.id,
            display_name = %self.participant.display_name,
            "[CHAT] Participant connected"
        );
    }

    pub fn participant(&self) -> &Participant {
        &self.participant
    }

    pub fn id(&self) -> ParticipantId {
        self.participant.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Replies scheduled and not yet handed back.
    pub fn pending_replies(&self) -> usize {
        self.pending.iter().filter(|handle| !handle.is_finished()).count()
    }

    /// Process one inbound message.
    ///
    /// Returns the broadcast message. Invalid content yields
    /// [`ChatError::Validation`] and has no other effect.
    pub async fn handle_inbound(&mut self, inbound: InboundMessage) -> Result<ChatMessage> {
        if self.state != SessionState::Active {
            return Err(ChatError::SessionClosed);
        }
        self.stats.messages_received += 1;

        let content = match validate_content(&inbound.content) {
            Ok(content) => content,
            Err(e) => {
                self.stats.messages_rejected += 1;
                debug!(participant_id = %self.participant.id, error = %e, "[CHAT] Inbound message rejected");
                return Err(e);
            }
        };

        let message = ChatMessage::new(self.hub.next_message_id(), &self.participant, content);
        let delivered = self.hub.registry().broadcast(&message, None).await;
        self.stats.messages_accepted += 1;
        debug!(
            participant_id = %self.participant.id,
            message_id = message.id,
            delivered,
            "[CHAT] Message broadcast"
        );

        self.pending.retain(|handle| !handle.is_finished());
        let handle = self.hub.scheduler().schedule(&message, self.replies_tx.clone());
        self.pending.push(handle);

        Ok(message)
    }

    /// Deliver a scheduled reply to this session's participant only.
    pub async fn deliver_reply(&mut self, reply: ChatMessage) {
        if self.state != SessionState::Active {
            self.stats.replies_dropped += 1;
            debug!(reply_id = reply.id, "[CHAT] Reply dropped, session closed");
            return;
        }

        match self.hub.registry().send_to(&self.participant.id, &reply).await {
            Ok(()) => {
                self.stats.replies_delivered += 1;
                debug!(participant_id = %self.participant.id, reply_id = reply.id, "[CHAT] Reply delivered");
            }
            Err(e) => {
                self.stats.replies_dropped += 1;
                warn!(
                    participant_id = %self.participant.id,
                    reply_id = reply.id,
                    error = %e,
                    "[CHAT] Reply not delivered"
                );
            }
        }
        self.pending.retain(|handle| !handle.is_finished());
    }

    /// Drive the session until the inbound stream ends or the hub shuts down,
    /// then close it.
    pub async fn run<S: InboundStream>(mut self, mut inbound: S) -> SessionStats {
        let mut shutdown = self.shutdown.clone();

        loop {
            tokio::select! {
                next = inbound.next() => match next {
                    Some(message) => {
                        // Validation failures are already logged.
                        let _ = self.handle_inbound(message).await;
                    }
                    None => {
                        debug!(participant_id = %self.participant.id, "[CHAT] Inbound stream ended");
                        break;
                    }
                },
                Some(reply) = self.replies_rx.recv() => {
                    self.deliver_reply(reply).await;
                }
                _ = shutdown_requested(&mut shutdown) => {
                    info!(participant_id = %self.participant.id, "[CHAT] Closing session for shutdown");
                    break;
                }
            }
        }

        self.close().await;
        self.stats
    }

    /// Close the session. Idempotent.
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closed;

        let cancelled = self.pending.iter().filter(|handle| !handle.is_finished()).count();
        for handle in self.pending.drain(..) {
            handle.cancel();
        }

        self.hub.registry().remove(&self.participant.id).await;
        self.channel.close();
        self.replies_rx.close();

        let duration = self.started_at.elapsed();
        info!(
            participant_id = %self.participant.id,
            display_name = %self.participant.display_name,
            duration_ms = duration.as_millis() as u64,
            messages_received = self.stats.messages_received,
            messages_accepted = self.stats.messages_accepted,
            messages_rejected = self.stats.messages_rejected,
            replies_delivered = self.stats.replies_delivered,
            replies_cancelled = cancelled,
            "[CHAT] Participant disconnected"
        );
    }
}
