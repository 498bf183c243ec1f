//! # Responder Scheduler
//!
//! The synthetic "AI Assistant": a templated reply to every accepted human
//! message, delivered after a fixed delay.
//!
//! Reply text is a pure function of the triggering content ([`compose_reply`]),
//! kept apart from the timer mechanics ([`ResponderScheduler::schedule`]) so it
//! can be tested without waiting.
//!
//! A scheduled reply is not delivered directly. It is handed back to the owning
//! session through its reply queue; the session decides where it goes. If the
//! session is gone by then the reply is dropped.

use super::state::MessageIds;
use lib_core::dto::{ChatMessage, Participant};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Display name of the synthetic responder.
pub const RESPONDER_NAME: &str = "AI Assistant";

/// Sent to each participant right after it connects.
pub const WELCOME_MESSAGE: &str =
    "Welcome to ChatGenius! I'm your AI assistant. How can I help you today?";

/// Default delay between a human message and its reply.
pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(1000);

const PLACEHOLDER: &str = "{message}";

/// Reply templates. Each one quotes the triggering message.
pub const REPLY_TEMPLATES: [&str; 5] = [
    "That's an interesting point about \"{message}\". Can you elaborate?",
    "I understand you're talking about \"{message}\". How can I assist you further?",
    "\"{message}\" is a complex topic. What specific aspect would you like to explore?",
    "Thanks for sharing your thoughts on \"{message}\". What's your main concern?",
    "I see you're interested in \"{message}\". What would you like to know more about?",
];

/// Render the template at `index` (wrapping) for `content`.
pub fn compose_reply_with(content: &str, index: usize) -> String {
    REPLY_TEMPLATES[index % REPLY_TEMPLATES.len()].replace(PLACEHOLDER, content)
}

/// Render a uniformly chosen template for `content`.
pub fn compose_reply(content: &str) -> String {
    let index = rand::thread_rng().gen_range(0..REPLY_TEMPLATES.len());
    compose_reply_with(content, index)
}

/// The responder's participant identity. Never registered.
pub fn responder_identity() -> Participant {
    Participant::synthetic(RESPONDER_NAME)
}

/// Handle to one pending reply.
///
/// Dropping the handle does not cancel the reply; call [`cancel`](Self::cancel).
#[derive(Debug)]
pub struct ReplyHandle {
    trigger_id: u64,
    task: JoinHandle<()>,
}

impl ReplyHandle {
    /// Suppress delivery. No effect once the reply was handed over.
    pub fn cancel(&self) {
        if !self.task.is_finished() {
            debug!(trigger_id = self.trigger_id, "[RESPONDER] Reply cancelled");
        }
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Id of the message this reply answers.
    pub fn trigger_id(&self) -> u64 {
        self.trigger_id
    }
}

#[derive(Debug)]
pub struct ResponderScheduler {
    delay: Duration,
    responder: Participant,
    ids: Arc<MessageIds>,
}

impl ResponderScheduler {
    pub fn new(delay: Duration, ids: Arc<MessageIds>) -> Self {
        Self {
            delay,
            responder: responder_identity(),
            ids,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn responder(&self) -> &Participant {
        &self.responder
    }

    /// Start the reply timer for `trigger`.
    ///
    /// After the delay the reply is built (fresh id and timestamp) and pushed
    /// onto `replies`. A closed queue means the session ended; the reply is
    /// dropped without retry.
    pub fn schedule(
        &self,
        trigger: &ChatMessage,
        replies: mpsc::UnboundedSender<ChatMessage>,
    ) -> ReplyHandle {
        let trigger_id = trigger.id;
        let content = trigger.content.clone();
        let delay = self.delay;
        let responder = self.responder.clone();
        let ids = Arc::clone(&self.ids);

        debug!(
            trigger_id,
            delay_ms = delay.as_millis() as u64,
            "[RESPONDER] Reply scheduled"
        );

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let reply = ChatMessage::new(ids.next(), &responder, compose_reply(&content));
            let reply_id = reply.id;
            if replies.send(reply).is_err() {
                debug!(trigger_id, reply_id, "[RESPONDER] Session gone, reply dropped");
            }
        });

        ReplyHandle { trigger_id, task }
    }
}
