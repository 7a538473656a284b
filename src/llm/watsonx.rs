use async_trait::async_trait;
use log::{ error, info, warn };
use reqwest::{ Client as HttpClient, header::AUTHORIZATION };
use serde::Serialize;
use serde_json::Value;

use super::{ ChatClient, MemoryMode, ProviderConfig };
use crate::error::RelayError;
use crate::models::chat::ChatMessage;

/// Returned when the provider answers 2xx but none of the known response
/// shapes yields a non-empty reply. Degrading to this string is a contract,
/// not an error.
pub const FALLBACK_REPLY: &str = "No reply";

#[derive(Serialize)]
struct AiServiceRequest<'a> {
    messages: &'a [ChatMessage],
}

#[derive(Serialize)]
struct PredictionsRequest<'a> {
    input_data: Vec<InputText<'a>>,
}

#[derive(Serialize)]
struct InputText<'a> {
    text: &'a str,
}

/// Adapter for a watsonx deployment. Depending on the configured memory
/// mode it targets either the chat-style `ai_service` endpoint or the
/// stateless `predictions` endpoint of the same deployment.
pub struct WatsonxClient {
    http: HttpClient,
    base_url: String,
    deployment_id: String,
    api_version: String,
    mode: MemoryMode,
}

impl WatsonxClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, RelayError> {
        let http = HttpClient::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RelayError::Provider(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            deployment_id: config.deployment_id.clone(),
            api_version: config.api_version.clone(),
            mode: config.mode,
        })
    }

    fn endpoint(&self) -> String {
        let route = match self.mode {
            MemoryMode::FullHistory => "ai_service",
            MemoryMode::SingleTurn => "predictions",
        };
        format!(
            "{}/ml/v4/deployments/{}/{}?version={}",
            self.base_url,
            self.deployment_id,
            route,
            self.api_version
        )
    }

    async fn post_json(&self, body: &impl Serialize, bearer: &str) -> Result<Value, RelayError> {
        let url = self.endpoint();
        let resp = self.http
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", bearer))
            .json(body)
            .send().await
            .map_err(|e| RelayError::Provider(format!("request to watsonx failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!("watsonx returned {}: {}", status, body);
            return Err(RelayError::Provider(format!("watsonx returned {}: {}", status, body)));
        }

        resp
            .json().await
            .map_err(|e| RelayError::Provider(format!("unparseable watsonx body: {}", e)))
    }
}

#[async_trait]
impl ChatClient for WatsonxClient {
    async fn send_chat(
        &self,
        messages: &[ChatMessage],
        bearer: &str
    ) -> Result<String, RelayError> {
        let body = match self.mode {
            MemoryMode::FullHistory => {
                self.post_json(&AiServiceRequest { messages }, bearer).await?
            }
            MemoryMode::SingleTurn => {
                let latest = messages
                    .last()
                    .ok_or_else(|| RelayError::Provider("no message to send".to_string()))?;
                let request = PredictionsRequest {
                    input_data: vec![InputText { text: &latest.content }],
                };
                self.post_json(&request, bearer).await?
            }
        };

        info!("watsonx response received");
        Ok(extract_reply(&body))
    }
}

/// Ordered reply-extraction strategies. Deployments answer in one of several
/// shapes depending on how the service was authored; the first strategy that
/// produces a non-empty string wins.
const EXTRACTORS: &[fn(&Value) -> Option<&str>] = &[
    chat_choice_content,
    output_content,
    generated_text,
    prediction_text,
];

pub fn extract_reply(body: &Value) -> String {
    for extract in EXTRACTORS {
        if let Some(text) = extract(body) {
            if !text.is_empty() {
                return text.to_string();
            }
        }
    }
    warn!("watsonx response matched no known shape, using fallback reply");
    FALLBACK_REPLY.to_string()
}

// choices[0].message.content
fn chat_choice_content(body: &Value) -> Option<&str> {
    body.get("choices")?.get(0)?.get("message")?.get("content")?.as_str()
}

// output[0].content
fn output_content(body: &Value) -> Option<&str> {
    body.get("output")?.get(0)?.get("content")?.as_str()
}

// results[0].generated_text
fn generated_text(body: &Value) -> Option<&str> {
    body.get("results")?.get(0)?.get("generated_text")?.as_str()
}

// predictions[0].values[0].text
fn prediction_text(body: &Value) -> Option<&str> {
    body.get("predictions")?.get(0)?.get("values")?.get(0)?.get("text")?.as_str()
}
