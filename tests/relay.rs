//! Relay orchestration tests driven through stubbed token and provider
//! clients, covering turn commit policy, memory modes, and validation.

use async_trait::async_trait;
use std::sync::atomic::{ AtomicUsize, Ordering };
use std::sync::Arc;
use tokio::sync::Mutex;

use watsonx_relay::agent::RelayAgent;
use watsonx_relay::auth::TokenSource;
use watsonx_relay::error::RelayError;
use watsonx_relay::history::ConversationStore;
use watsonx_relay::llm::{ ChatClient, MemoryMode };
use watsonx_relay::models::chat::{ ChatMessage, Role };

struct StaticToken {
    calls: AtomicUsize,
}

impl StaticToken {
    fn new() -> Arc<Self> {
        Arc::new(Self { calls: AtomicUsize::new(0) })
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn bearer(&self) -> Result<String, RelayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("test-token".to_string())
    }
}

struct FailingToken;

#[async_trait]
impl TokenSource for FailingToken {
    async fn bearer(&self) -> Result<String, RelayError> {
        Err(RelayError::Auth("IAM returned 400: BXNIM0415E".to_string()))
    }
}

/// Returns a canned reply and records every outbound message list.
struct StubChat {
    reply: String,
    sent: Mutex<Vec<Vec<ChatMessage>>>,
}

impl StubChat {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self { reply: reply.to_string(), sent: Mutex::new(Vec::new()) })
    }
}

#[async_trait]
impl ChatClient for StubChat {
    async fn send_chat(
        &self,
        messages: &[ChatMessage],
        _bearer: &str
    ) -> Result<String, RelayError> {
        self.sent.lock().await.push(messages.to_vec());
        Ok(self.reply.clone())
    }
}

struct FailingChat;

#[async_trait]
impl ChatClient for FailingChat {
    async fn send_chat(
        &self,
        _messages: &[ChatMessage],
        _bearer: &str
    ) -> Result<String, RelayError> {
        Err(RelayError::Provider("watsonx returned 503".to_string()))
    }
}

fn agent(
    tokens: Arc<dyn TokenSource>,
    chat: Arc<dyn ChatClient>,
    mode: MemoryMode
) -> RelayAgent {
    RelayAgent::new(tokens, chat, ConversationStore::new(100), mode, 4000)
}

#[tokio::test]
async fn successful_turn_returns_reply_and_records_both_messages() {
    let chat = StubChat::new("hi there");
    let relay = agent(StaticToken::new(), chat.clone(), MemoryMode::FullHistory);

    let reply = relay.handle_message("hello").await.unwrap();
    assert_eq!(reply, "hi there");

    let log = relay.history().await;
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].role, Role::User);
    assert_eq!(log[0].content, "hello");
    assert_eq!(log[1].role, Role::Assistant);
    assert_eq!(log[1].content, "hi there");
}

#[tokio::test]
async fn full_history_mode_resends_prior_turns() {
    let chat = StubChat::new("ack");
    let relay = agent(StaticToken::new(), chat.clone(), MemoryMode::FullHistory);

    relay.handle_message("first").await.unwrap();
    relay.handle_message("second").await.unwrap();

    let sent = chat.sent.lock().await;
    // Second request carries the whole first turn plus the new message.
    assert_eq!(sent[0].len(), 1);
    assert_eq!(sent[1].len(), 3);
    assert_eq!(sent[1][0].content, "first");
    assert_eq!(sent[1][1].content, "ack");
    assert_eq!(sent[1][2].content, "second");
}

#[tokio::test]
async fn single_turn_mode_sends_only_the_latest_message_and_keeps_no_state() {
    let chat = StubChat::new("stateless");
    let relay = agent(StaticToken::new(), chat.clone(), MemoryMode::SingleTurn);

    relay.handle_message("one").await.unwrap();
    relay.handle_message("two").await.unwrap();

    let sent = chat.sent.lock().await;
    assert_eq!(sent[0].len(), 1);
    assert_eq!(sent[1].len(), 1);
    assert_eq!(sent[1][0].content, "two");
    assert_eq!(relay.history_len().await, 0);
}

#[tokio::test]
async fn token_failure_leaves_the_log_unchanged() {
    let relay = agent(
        Arc::new(FailingToken),
        StubChat::new("unreachable"),
        MemoryMode::FullHistory
    );

    let err = relay.handle_message("x").await.unwrap_err();
    assert!(matches!(err, RelayError::Auth(_)));
    assert_eq!(relay.history_len().await, 0);
}

#[tokio::test]
async fn provider_failure_leaves_the_log_unchanged() {
    let relay = agent(StaticToken::new(), Arc::new(FailingChat), MemoryMode::FullHistory);

    relay.handle_message("warmup").await.unwrap_err();
    let err = relay.handle_message("again").await.unwrap_err();
    assert!(matches!(err, RelayError::Provider(_)));
    assert_eq!(relay.history_len().await, 0);
}

#[tokio::test]
async fn empty_message_is_rejected_without_any_calls() {
    let tokens = StaticToken::new();
    let chat = StubChat::new("never");
    let relay = agent(tokens.clone(), chat.clone(), MemoryMode::FullHistory);

    let err = relay.handle_message("   ").await.unwrap_err();
    assert!(matches!(err, RelayError::Validation(_)));
    assert_eq!(tokens.calls.load(Ordering::SeqCst), 0);
    assert!(chat.sent.lock().await.is_empty());
    assert_eq!(relay.history_len().await, 0);
}

#[tokio::test]
async fn oversized_message_is_rejected_without_any_calls() {
    let tokens = StaticToken::new();
    let chat = StubChat::new("never");
    let relay = RelayAgent::new(
        tokens.clone(),
        chat.clone(),
        ConversationStore::new(100),
        MemoryMode::FullHistory,
        16
    );

    let err = relay.handle_message(&"a".repeat(17)).await.unwrap_err();
    assert!(matches!(err, RelayError::Validation(_)));
    assert_eq!(tokens.calls.load(Ordering::SeqCst), 0);
    assert!(chat.sent.lock().await.is_empty());
}

#[tokio::test]
async fn reset_clears_history_and_is_idempotent() {
    let relay = agent(StaticToken::new(), StubChat::new("ok"), MemoryMode::FullHistory);

    relay.handle_message("hello").await.unwrap();
    assert_eq!(relay.history_len().await, 2);

    relay.handle_reset().await;
    assert_eq!(relay.history_len().await, 0);

    relay.handle_reset().await;
    assert_eq!(relay.history_len().await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_turns_interleave_only_at_turn_granularity() {
    let relay = Arc::new(
        agent(StaticToken::new(), StubChat::new("echo"), MemoryMode::FullHistory)
    );

    let mut handles = Vec::new();
    for i in 0..10 {
        let relay = Arc::clone(&relay);
        handles.push(tokio::spawn(async move {
            relay.handle_message(&format!("q-{}", i)).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let log = relay.history().await;
    assert_eq!(log.len(), 20);
    for pair in log.chunks(2) {
        assert_eq!(pair[0].role, Role::User);
        assert_eq!(pair[1].role, Role::Assistant);
    }
}
