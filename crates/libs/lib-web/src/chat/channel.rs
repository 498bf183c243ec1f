//! # Message Channel
//!
//! Per-connection transport abstraction.
//!
//! The outbound half is a [`MessageChannel`]: shared between the owning session
//! and the registry, so `send` never suspends and may be called while the
//! registry lock is held. The inbound half is any [`InboundStream`]: a lazy,
//! non-restartable sequence of client messages that ends when the transport
//! closes.
//!
//! [`QueuedChannel`] is the implementation used by the WebSocket handler: sends
//! are queued on a bounded outbox which a writer task drains into the socket.
//! A reader that falls [`OUTBOX_CAPACITY`] messages behind gets its channel
//! closed instead of holding the backlog in memory.

use super::error::{ChatError, Result};
use futures_util::Stream;
use lib_core::dto::{ChatMessage, InboundMessage};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::warn;

/// Messages a connection may have queued before it counts as stalled.
pub const OUTBOX_CAPACITY: usize = 256;

/// Outbound capability of a connection.
pub trait MessageChannel: Send + Sync {
    /// Queue `message` for delivery, failing with [`ChatError::ChannelClosed`] after close.
    fn send(&self, message: &ChatMessage) -> Result<()>;

    /// Close the channel. Idempotent.
    fn close(&self);

    fn is_closed(&self) -> bool;
}

/// Inbound capability of a connection: messages in transport order, `None` on close.
pub trait InboundStream: Stream<Item = InboundMessage> + Send + Unpin {}

impl<T> InboundStream for T where T: Stream<Item = InboundMessage> + Send + Unpin {}

/// Receiving end of a [`QueuedChannel`], drained by the transport writer.
pub type Outbox = mpsc::Receiver<ChatMessage>;

/// Channel backed by a bounded queue.
///
/// Closing drops the queue's sender, so the [`Outbox`] yields the messages
/// already queued and then ends. A full queue closes the channel the same way.
#[derive(Debug)]
pub struct QueuedChannel {
    outbox: Mutex<Option<mpsc::Sender<ChatMessage>>>,
}

impl QueuedChannel {
    pub fn new() -> (Arc<Self>, Outbox) {
        Self::with_capacity(OUTBOX_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> (Arc<Self>, Outbox) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let channel = Arc::new(Self {
            outbox: Mutex::new(Some(tx)),
        });
        (channel, rx)
    }
}

impl MessageChannel for QueuedChannel {
    fn send(&self, message: &ChatMessage) -> Result<()> {
        let mut outbox = self.outbox.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = outbox.as_ref() else {
            return Err(ChatError::ChannelClosed);
        };

        match tx.try_send(message.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                warn!(
                    message_id = message.id,
                    capacity = tx.max_capacity(),
                    "[CHANNEL] Outbox full, closing stalled connection"
                );
                outbox.take();
                Err(ChatError::ChannelClosed)
            }
            Err(TrySendError::Closed(_)) => Err(ChatError::ChannelClosed),
        }
    }

    fn close(&self) {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    fn is_closed(&self) -> bool {
        let outbox = self.outbox.lock().unwrap_or_else(PoisonError::into_inner);
        // The writer dropping the outbox counts as closed too.
        outbox.as_ref().map_or(true, |tx| tx.is_closed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_core::dto::Participant;

    fn message(content: &str) -> ChatMessage {
        ChatMessage::new(1, &Participant::human("Guest1"), content)
    }

    #[tokio::test]
    async fn test_send_then_receive_in_order() {
        let (channel, mut outbox) = QueuedChannel::new();

        channel.send(&message("first")).unwrap();
        channel.send(&message("second")).unwrap();

        assert_eq!(outbox.recv().await.unwrap().content, "first");
        assert_eq!(outbox.recv().await.unwrap().content, "second");
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        let (channel, mut outbox) = QueuedChannel::new();
        channel.send(&message("queued")).unwrap();

        channel.close();
        channel.close();

        assert!(channel.is_closed());
        assert_eq!(channel.send(&message("late")), Err(ChatError::ChannelClosed));
        // Already-queued messages still drain, then the outbox ends.
        assert_eq!(outbox.recv().await.unwrap().content, "queued");
        assert!(outbox.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_full_outbox_closes_channel() {
        let (channel, mut outbox) = QueuedChannel::with_capacity(2);

        channel.send(&message("one")).unwrap();
        channel.send(&message("two")).unwrap();
        assert_eq!(channel.send(&message("three")), Err(ChatError::ChannelClosed));

        assert!(channel.is_closed());
        assert_eq!(channel.send(&message("four")), Err(ChatError::ChannelClosed));
        // The backlog stays bounded: what fit is drained, then the outbox ends.
        assert_eq!(outbox.recv().await.unwrap().content, "one");
        assert_eq!(outbox.recv().await.unwrap().content, "two");
        assert!(outbox.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_reader_keeping_up_never_fills() {
        let (channel, mut outbox) = QueuedChannel::with_capacity(1);

        for i in 0..10 {
            channel.send(&message(&format!("m{i}"))).unwrap();
            assert_eq!(outbox.recv().await.unwrap().content, format!("m{i}"));
        }
        assert!(!channel.is_closed());
    }

    #[test]
    fn test_dropped_outbox_reports_closed() {
        let (channel, outbox) = QueuedChannel::new();
        assert!(!channel.is_closed());

        drop(outbox);

        assert!(channel.is_closed());
        assert_eq!(channel.send(&message("lost")), Err(ChatError::ChannelClosed));
    }
}
