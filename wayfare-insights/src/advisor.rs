use serde::{Deserialize, Serialize};
use std::sync::Arc;
use wayfare_core::assistant::{Assistant, ChatTurn};
use wayfare_core::{CoreError, CoreResult};

use crate::preferences::PreferenceProfile;
use crate::prompts;

/// Turns of history forwarded with a chat message.
const MAX_HISTORY: usize = 20;
const SUGGESTION_COUNT: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub destination: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub best_month: Option<String>,
}

/// Parsed suggestions. When the model ignores the JSON format the raw reply
/// is passed through in `summary`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionSet {
    pub suggestions: Vec<Suggestion>,
    pub summary: Option<String>,
}

/// Travel features backed by the hosted language model
pub struct TravelAdvisor {
    assistant: Arc<dyn Assistant>,
}

impl TravelAdvisor {
    pub fn new(assistant: Arc<dyn Assistant>) -> Self {
        Self { assistant }
    }

    pub async fn chat(&self, message: &str, history: Vec<ChatTurn>) -> CoreResult<String> {
        let message = message.trim();
        if message.is_empty() {
            return Err(CoreError::validation("message is required"));
        }

        let skip = history.len().saturating_sub(MAX_HISTORY);
        let mut turns: Vec<ChatTurn> = history.into_iter().skip(skip).collect();
        turns.push(ChatTurn::user(message));

        self.assistant.complete(prompts::CHAT_SYSTEM, &turns).await
    }

    pub async fn suggestions(&self, profile: &PreferenceProfile) -> CoreResult<SuggestionSet> {
        let prompt = prompts::suggestions_prompt(profile, SUGGESTION_COUNT);
        let reply = self
            .assistant
            .complete(prompts::SUGGESTIONS_SYSTEM, &[ChatTurn::user(prompt)])
            .await?;

        Ok(match parse_suggestions(&reply) {
            Some(suggestions) => SuggestionSet {
                suggestions,
                summary: None,
            },
            None => {
                tracing::warn!("Suggestion reply was not a JSON array, passing text through");
                SuggestionSet {
                    suggestions: Vec::new(),
                    summary: Some(reply.trim().to_string()),
                }
            }
        })
    }

    pub async fn visa_analysis(&self, nationality: &str, destination: &str) -> CoreResult<String> {
        let (nationality, destination) = (nationality.trim(), destination.trim());
        if nationality.is_empty() || destination.is_empty() {
            return Err(CoreError::validation("nationality and destination are required"));
        }
        let prompt = prompts::visa_prompt(nationality, destination);
        self.assistant
            .complete(prompts::VISA_SYSTEM, &[ChatTurn::user(prompt)])
            .await
    }

    pub async fn news_analysis(&self, destination: &str) -> CoreResult<String> {
        let destination = destination.trim();
        if destination.is_empty() {
            return Err(CoreError::validation("destination is required"));
        }
        let prompt = prompts::news_prompt(destination);
        self.assistant
            .complete(prompts::NEWS_SYSTEM, &[ChatTurn::user(prompt)])
            .await
    }
}

/// Models often wrap JSON in prose or code fences; take the outermost array.
fn parse_suggestions(reply: &str) -> Option<Vec<Suggestion>> {
    let start = reply.find('[')?;
    let end = reply.rfind(']')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&reply[start..=end]).ok()
}
