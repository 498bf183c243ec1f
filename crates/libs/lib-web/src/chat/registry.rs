//! # Participant Registry
//!
//! The one piece of shared mutable state in the chat engine: the set of
//! currently connected participants and their outbound channels.
//!
//! Every operation takes the same mutex, so `add`, `remove` and `broadcast`
//! never observe each other half-done, and broadcasts reach each recipient in
//! the order the `broadcast` calls acquired the lock.

use super::channel::MessageChannel;
use super::error::{ChatError, Result};
use lib_core::dto::{ChatMessage, Participant, ParticipantId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

struct RegistryEntry {
    participant: Participant,
    channel: Arc<dyn MessageChannel>,
}

#[derive(Default)]
pub struct ParticipantRegistry {
    entries: Mutex<HashMap<ParticipantId, RegistryEntry>>,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a participant with its channel.
    ///
    /// # Errors
    ///
    /// [`ChatError::DuplicateParticipant`] if the id is already registered.
    pub async fn add(&self, participant: Participant, channel: Arc<dyn MessageChannel>) -> Result<()> {
        let mut entries = self.entries.lock().await;

        if entries.contains_key(&participant.id) {
            return Err(ChatError::DuplicateParticipant(participant.id));
        }

        debug!(
            participant_id = %participant.id,
            display_name = %participant.display_name,
            total = entries.len() + 1,
            "[REGISTRY] Participant added"
        );
        entries.insert(participant.id, RegistryEntry { participant, channel });
        Ok(())
    }

    /// Deregister a participant. Absent ids are a no-op.
    ///
    /// Returns the removed participant, if any.
    pub async fn remove(&self, id: &ParticipantId) -> Option<Participant> {
        let mut entries = self.entries.lock().await;
        let removed = entries.remove(id).map(|entry| entry.participant);

        if removed.is_some() {
            debug!(participant_id = %id, total = entries.len(), "[REGISTRY] Participant removed");
        }
        removed
    }

    /// Snapshot of the registered participants.
    pub async fn list(&self) -> Vec<Participant> {
        let entries = self.entries.lock().await;
        entries.values().map(|entry| entry.participant.clone()).collect()
    }

    pub async fn contains(&self, id: &ParticipantId) -> bool {
        self.entries.lock().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Deliver `message` to every registered participant except `exclude`.
    ///
    /// Closed channels are logged and skipped. Returns the number of
    /// participants the message was queued for.
    pub async fn broadcast(&self, message: &ChatMessage, exclude: Option<ParticipantId>) -> usize {
        let entries = self.entries.lock().await;
        let mut delivered = 0;

        for (id, entry) in entries.iter() {
            if Some(*id) == exclude {
                continue;
            }

            match entry.channel.send(message) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(
                        participant_id = %id,
                        message_id = message.id,
                        error = %e,
                        "[REGISTRY] Broadcast skipped recipient"
                    );
                }
            }
        }

        debug!(
            message_id = message.id,
            sender_id = %message.sender_id,
            delivered,
            "[REGISTRY] Broadcast complete"
        );
        delivered
    }

    /// Deliver `message` to a single registered participant.
    ///
    /// # Errors
    ///
    /// - [`ChatError::UnknownParticipant`] if the id is not registered
    /// - [`ChatError::ChannelClosed`] if its channel is closed
    pub async fn send_to(&self, id: &ParticipantId, message: &ChatMessage) -> Result<()> {
        let entries = self.entries.lock().await;
        let entry = entries.get(id).ok_or(ChatError::UnknownParticipant(*id))?;
        entry.channel.send(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::channel::{Outbox, QueuedChannel};
    use std::collections::HashSet;

    fn connected(name: &str) -> (Participant, Arc<QueuedChannel>, Outbox) {
        let (channel, outbox) = QueuedChannel::new();
        (Participant::human(name), channel, outbox)
    }

    #[tokio::test]
    async fn test_add_rejects_duplicate_id() {
        let registry = ParticipantRegistry::new();
        let (alice, channel, _outbox) = connected("Guest1");

        registry.add(alice.clone(), channel.clone()).await.unwrap();
        let result = registry.add(alice.clone(), channel).await;

        assert_eq!(result, Err(ChatError::DuplicateParticipant(alice.id)));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let registry = ParticipantRegistry::new();
        let (alice, channel, _outbox) = connected("Guest1");
        registry.add(alice.clone(), channel).await.unwrap();

        assert_eq!(registry.remove(&alice.id).await, Some(alice.clone()));
        assert_eq!(registry.remove(&alice.id).await, None);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_list_returns_snapshot() {
        let registry = ParticipantRegistry::new();
        let (alice, a_channel, _a) = connected("Guest1");
        let (bob, b_channel, _b) = connected("Guest2");
        registry.add(alice.clone(), a_channel).await.unwrap();
        registry.add(bob.clone(), b_channel).await.unwrap();

        let ids: HashSet<_> = registry.list().await.into_iter().map(|p| p.id).collect();

        assert_eq!(ids, HashSet::from([alice.id, bob.id]));
    }

    #[tokio::test]
    async fn test_broadcast_reaches_everyone_without_exclusion() {
        let registry = ParticipantRegistry::new();
        let (alice, a_channel, mut a_outbox) = connected("Guest1");
        let (bob, b_channel, mut b_outbox) = connected("Guest2");
        registry.add(alice.clone(), a_channel).await.unwrap();
        registry.add(bob, b_channel).await.unwrap();

        let message = ChatMessage::new(1, &alice, "hi");
        let delivered = registry.broadcast(&message, None).await;

        assert_eq!(delivered, 2);
        assert_eq!(a_outbox.recv().await, Some(message.clone()));
        assert_eq!(b_outbox.recv().await, Some(message));
    }

    #[tokio::test]
    async fn test_broadcast_honours_exclusion() {
        let registry = ParticipantRegistry::new();
        let (alice, a_channel, mut a_outbox) = connected("Guest1");
        let (bob, b_channel, mut b_outbox) = connected("Guest2");
        registry.add(alice.clone(), a_channel).await.unwrap();
        registry.add(bob, b_channel).await.unwrap();

        let message = ChatMessage::new(1, &alice, "hi");
        let delivered = registry.broadcast(&message, Some(alice.id)).await;

        assert_eq!(delivered, 1);
        assert_eq!(b_outbox.recv().await, Some(message));
        assert!(a_outbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_skips_closed_channels() {
        let registry = ParticipantRegistry::new();
        let (alice, a_channel, _a_outbox) = connected("Guest1");
        let (bob, b_channel, mut b_outbox) = connected("Guest2");
        registry.add(alice.clone(), a_channel.clone()).await.unwrap();
        registry.add(bob, b_channel).await.unwrap();
        a_channel.close();

        let message = ChatMessage::new(1, &alice, "still here?");
        let delivered = registry.broadcast(&message, None).await;

        assert_eq!(delivered, 1);
        assert_eq!(b_outbox.recv().await, Some(message));
    }

    #[tokio::test]
    async fn test_stalled_reader_is_cut_off_without_affecting_others() {
        let registry = ParticipantRegistry::new();
        let (s_channel, mut s_outbox) = QueuedChannel::with_capacity(4);
        let sleeper = Participant::human("Guest1");
        let (bob, b_channel, mut b_outbox) = connected("Guest2");
        registry.add(sleeper.clone(), s_channel.clone()).await.unwrap();
        registry.add(bob.clone(), b_channel).await.unwrap();

        for id in 1..=100 {
            let message = ChatMessage::new(id, &bob, format!("m{id}"));
            registry.broadcast(&message, None).await;
            assert_eq!(b_outbox.recv().await.map(|m| m.id), Some(id));
        }

        let message = ChatMessage::new(101, &bob, "after");
        assert_eq!(registry.broadcast(&message, None).await, 1);
        assert!(s_channel.is_closed());
        assert!(registry.contains(&sleeper.id).await);

        // Only the first few messages were ever held for the stalled reader.
        let mut backlog = 0;
        while s_outbox.recv().await.is_some() {
            backlog += 1;
        }
        assert_eq!(backlog, 4);
    }

    #[tokio::test]
    async fn test_broadcast_order_matches_call_order() {
        let registry = ParticipantRegistry::new();
        let (alice, a_channel, mut a_outbox) = connected("Guest1");
        registry.add(alice.clone(), a_channel).await.unwrap();

        for id in 1..=5 {
            registry.broadcast(&ChatMessage::new(id, &alice, format!("m{id}")), None).await;
        }

        for id in 1..=5 {
            assert_eq!(a_outbox.recv().await.map(|m| m.id), Some(id));
        }
    }

    #[tokio::test]
    async fn test_send_to_unknown_participant() {
        let registry = ParticipantRegistry::new();
        let stranger = Participant::human("Guest9");
        let message = ChatMessage::new(1, &stranger, "hello?");

        let result = registry.send_to(&stranger.id, &message).await;

        assert_eq!(result, Err(ChatError::UnknownParticipant(stranger.id)));
    }
}
