pub mod agent;
pub mod auth;
pub mod cli;
pub mod error;
pub mod history;
pub mod llm;
pub mod models;
pub mod server;

use agent::RelayAgent;
use auth::IamTokenProvider;
use cli::Args;
use history::ConversationStore;
use llm::ProviderConfig;
use log::info;
use models::chat::ChatMessage;
use server::start_http_server;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("watsonx API URL: {}", args.api_url);
    info!("Deployment ID: {}", args.deployment_id);
    info!("API Version: {}", args.api_version);
    info!("IAM URL: {}", args.iam_url);
    info!("Memory Mode: {}", args.memory_mode);
    info!("History Limit: {}", args.history_limit);
    info!("Max Message Chars: {}", args.max_message_chars);
    info!("Request Timeout: {}s", args.request_timeout_secs);
    info!("Listen Port: {}", args.port);
    info!("-------------------------");

    let timeout = Duration::from_secs(args.request_timeout_secs);

    let tokens = Arc::new(
        IamTokenProvider::new(args.iam_url.clone(), args.api_key.clone(), timeout)?
    );

    let provider_config = ProviderConfig {
        base_url: args.api_url.clone(),
        deployment_id: args.deployment_id.clone(),
        api_version: args.api_version.clone(),
        mode: args.memory_mode,
        timeout,
    };
    let chat_client = llm::new_client(&provider_config)?;

    let store = ConversationStore::new(args.history_limit);
    if let Some(greeting) = args.greeting.as_deref() {
        store.seed(ChatMessage::assistant(greeting)).await;
        info!("Seeded conversation with a greeting message");
    }

    let agent = Arc::new(
        RelayAgent::new(
            tokens,
            chat_client,
            store,
            args.memory_mode,
            args.max_message_chars
        )
    );

    start_http_server(args.port, agent).await
}
