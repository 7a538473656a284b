use log::{ info, warn };
use std::sync::Arc;

use crate::auth::TokenSource;
use crate::error::RelayError;
use crate::history::ConversationStore;
use crate::llm::{ ChatClient, MemoryMode };
use crate::models::chat::ChatMessage;

/// Orchestrates one chat turn: validate, obtain a bearer token, call the
/// provider, then commit the turn to the conversation log.
///
/// The user message is only recorded after the provider call succeeds, so a
/// failed turn leaves the log exactly as it was (commit-on-success).
pub struct RelayAgent {
    tokens: Arc<dyn TokenSource>,
    chat_client: Arc<dyn ChatClient>,
    store: ConversationStore,
    mode: MemoryMode,
    max_message_chars: usize,
}

impl RelayAgent {
    pub fn new(
        tokens: Arc<dyn TokenSource>,
        chat_client: Arc<dyn ChatClient>,
        store: ConversationStore,
        mode: MemoryMode,
        max_message_chars: usize
    ) -> Self {
        Self { tokens, chat_client, store, mode, max_message_chars }
    }

    pub async fn handle_message(&self, text: &str) -> Result<String, RelayError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(RelayError::Validation("message must not be empty".to_string()));
        }
        if text.chars().count() > self.max_message_chars {
            return Err(
                RelayError::Validation(
                    format!("message exceeds {} characters", self.max_message_chars)
                )
            );
        }

        info!("User message: {} char(s)", text.chars().count());
        let bearer = self.tokens.bearer().await?;

        let user_message = ChatMessage::user(text);
        let outbound = match self.mode {
            MemoryMode::FullHistory => {
                let mut messages = self.store.snapshot().await;
                messages.push(user_message.clone());
                messages
            }
            MemoryMode::SingleTurn => vec![user_message.clone()],
        };

        let reply = self.chat_client.send_chat(&outbound, &bearer).await?;

        if self.mode == MemoryMode::FullHistory {
            self.store.record_turn(user_message, ChatMessage::assistant(reply.clone())).await;
        }

        Ok(reply)
    }

    /// Forget all prior turns. Idempotent, never fails.
    pub async fn handle_reset(&self) {
        warn!("Clearing conversation history on request");
        self.store.reset().await;
    }

    pub async fn history_len(&self) -> usize {
        self.store.len().await
    }

    pub async fn history(&self) -> Vec<ChatMessage> {
        self.store.snapshot().await
    }
}
