pub mod watsonx;

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use self::watsonx::WatsonxClient;
use crate::error::RelayError;
use crate::models::chat::ChatMessage;

/// How much conversation context each provider request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryMode {
    /// Resend the whole conversation log each turn via the deployment's
    /// `ai_service` chat endpoint.
    FullHistory,
    /// Send only the latest user message via the `predictions` endpoint;
    /// no memory of prior turns.
    SingleTurn,
}

impl fmt::Display for MemoryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryMode::FullHistory => write!(f, "full-history"),
            MemoryMode::SingleTurn => write!(f, "single-turn"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseMemoryModeError {
    message: String,
}

impl fmt::Display for ParseMemoryModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseMemoryModeError {}

impl FromStr for MemoryMode {
    type Err = ParseMemoryModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full-history" | "full_history" => Ok(MemoryMode::FullHistory),
            "single-turn" | "single_turn" => Ok(MemoryMode::SingleTurn),
            _ =>
                Err(ParseMemoryModeError {
                    message: format!("Invalid memory mode: '{}'", s),
                }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub deployment_id: String,
    pub api_version: String,
    pub mode: MemoryMode,
    pub timeout: Duration,
}

/// Seam between the relay orchestrator and the external AI provider.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send the outbound message list with a bearer token and return the
    /// extracted reply text. In single-turn mode only the last message is
    /// transmitted.
    async fn send_chat(
        &self,
        messages: &[ChatMessage],
        bearer: &str
    ) -> Result<String, RelayError>;
}

pub fn new_client(config: &ProviderConfig) -> Result<Arc<dyn ChatClient>, RelayError> {
    let client = WatsonxClient::new(config)?;
    Ok(Arc::new(client))
}
