use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use wayfare_core::assistant::{Assistant, ChatRole, ChatTurn};
use wayfare_core::{CoreError, CoreResult};
use wayfare_shared::Masked;

use crate::app_config::LlmConfig;

const API_VERSION: &str = "2023-06-01";

/// Messages-API client for the hosted model
pub struct HttpAssistant {
    client: Client,
    api_key: Masked<String>,
    api_url: String,
    model: String,
    max_tokens: u32,
}

impl HttpAssistant {
    pub fn new(api_key: Masked<String>, config: &LlmConfig) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

fn wire_messages(turns: &[ChatTurn]) -> Vec<WireMessage<'_>> {
    turns
        .iter()
        .map(|t| WireMessage {
            role: match t.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "assistant",
            },
            content: &t.content,
        })
        .collect()
}

fn reply_text(response: MessagesResponse) -> String {
    response
        .content
        .into_iter()
        .filter(|b| b.kind == "text")
        .map(|b| b.text)
        .collect::<Vec<_>>()
        .join("")
}

#[async_trait]
impl Assistant for HttpAssistant {
    async fn complete(&self, system: &str, turns: &[ChatTurn]) -> CoreResult<String> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system,
            messages: wire_messages(turns),
        };

        let response = self
            .client
            .post(format!("{}/messages", self.api_url))
            .header("x-api-key", self.api_key.expose())
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| CoreError::ExternalService(format!("LLM request failed: {}", e)))?;

        match response.status() {
            StatusCode::OK => {
                let body = response.json::<MessagesResponse>().await.map_err(|e| {
                    CoreError::ExternalService(format!("Invalid LLM response: {}", e))
                })?;
                Ok(reply_text(body))
            }
            StatusCode::TOO_MANY_REQUESTS => Err(CoreError::ExternalService(
                "LLM rate limit reached, try again shortly".to_string(),
            )),
            StatusCode::UNAUTHORIZED => Err(CoreError::ExternalService(
                "LLM provider rejected the API key".to_string(),
            )),
            status => {
                let body = response.text().await.unwrap_or_default();
                tracing::error!("LLM error {}: {}", status, body);
                Err(CoreError::ExternalService(format!(
                    "LLM provider returned {}",
                    status.as_u16()
                )))
            }
        }
    }
}
