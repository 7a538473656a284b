use clap::Parser;

use crate::llm::MemoryMode;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- IBM Cloud Credentials ---
    /// IBM Cloud API key exchanged for IAM bearer tokens.
    #[arg(long, env = "IBM_API_KEY")]
    pub api_key: String,

    /// watsonx deployment identifier to relay messages to.
    #[arg(long, env = "IBM_DEPLOYMENT_ID")]
    pub deployment_id: String,

    /// Base URL of the watsonx ML API.
    #[arg(long, env = "IBM_API_URL", default_value = "https://us-south.ml.cloud.ibm.com")]
    pub api_url: String,

    /// API version query parameter sent on every deployment call.
    #[arg(long, env = "IBM_API_VERSION", default_value = "2021-05-01")]
    pub api_version: String,

    /// IAM token exchange endpoint.
    #[arg(long, env = "IBM_IAM_URL", default_value = "https://iam.cloud.ibm.com/identity/token")]
    pub iam_url: String,

    // --- Relay Behavior ---
    /// Conversation memory mode (full-history, single-turn).
    #[arg(long, env = "MEMORY_MODE", default_value = "full-history")]
    pub memory_mode: MemoryMode,

    /// Maximum number of messages retained in the conversation log; oldest
    /// entries are evicted beyond this. 0 disables the bound.
    #[arg(long, env = "HISTORY_LIMIT", default_value = "100")]
    pub history_limit: usize,

    /// Maximum accepted length of one inbound message, in characters.
    #[arg(long, env = "MAX_MESSAGE_CHARS", default_value = "4000")]
    pub max_message_chars: usize,

    /// Timeout in seconds applied to each outbound call (IAM and watsonx).
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub request_timeout_secs: u64,

    /// Optional assistant greeting seeded into the conversation at startup.
    #[arg(long, env = "GREETING")]
    pub greeting: Option<String>,

    // --- Server ---
    /// Port for the HTTP API server to listen on.
    #[arg(long, env = "PORT", default_value = "5000")]
    pub port: u16,
}
