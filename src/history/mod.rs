use log::debug;
use tokio::sync::Mutex;

use crate::models::chat::ChatMessage;

/// Process-wide ordered conversation log, shared by every inbound request.
///
/// All access goes through one async mutex so interleaved requests cannot
/// tear a turn apart; the lock is only held for in-memory work, never across
/// a network await. The log is bounded: once `max_messages` is reached the
/// oldest entries are evicted on append.
pub struct ConversationStore {
    messages: Mutex<Vec<ChatMessage>>,
    max_messages: usize,
}

impl ConversationStore {
    pub fn new(max_messages: usize) -> Self {
        Self { messages: Mutex::new(Vec::new()), max_messages }
    }

    /// Seed the log with an opening assistant message. Intended for startup
    /// only; `reset` does not restore it.
    pub async fn seed(&self, greeting: ChatMessage) {
        let mut messages = self.messages.lock().await;
        messages.push(greeting);
    }

    pub async fn append(&self, message: ChatMessage) {
        let mut messages = self.messages.lock().await;
        Self::push_bounded(&mut messages, message, self.max_messages);
    }

    /// Append a whole turn under a single lock acquisition so a concurrent
    /// turn can never land between the user message and its reply.
    pub async fn record_turn(&self, user: ChatMessage, assistant: ChatMessage) {
        let mut messages = self.messages.lock().await;
        Self::push_bounded(&mut messages, user, self.max_messages);
        Self::push_bounded(&mut messages, assistant, self.max_messages);
    }

    pub async fn reset(&self) {
        let mut messages = self.messages.lock().await;
        let dropped = messages.len();
        messages.clear();
        debug!("Conversation reset, dropped {} message(s)", dropped);
    }

    pub async fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.messages.lock().await.len()
    }

    fn push_bounded(messages: &mut Vec<ChatMessage>, message: ChatMessage, max: usize) {
        if max > 0 && messages.len() >= max {
            let overflow = messages.len() + 1 - max;
            messages.drain(..overflow);
        }
        messages.push(message);
    }
}
