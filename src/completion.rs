//! Completion gateway.
//!
//! Defines the [`CompletionProvider`] trait and the OpenAI chat
//! completions adapter. The core only produces the ordered message list;
//! this gateway hands it to the provider and returns the reply text plus
//! token count. Failures propagate as [`ProviderError`]s; the chat
//! pipeline decides how to degrade.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::CompletionConfig;
use crate::error::ProviderError;
use crate::http;
use crate::models::{ChatMessage, Completion};

/// Generates a completion from an ordered message list.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion, ProviderError>;
}

/// Completion provider using the OpenAI chat completions API.
///
/// Requires the `OPENAI_API_KEY` environment variable.
pub struct OpenAiCompletions {
    client: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    max_retries: u32,
}

impl OpenAiCompletions {
    pub fn new(config: &CompletionConfig) -> Result<Self, ProviderError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ProviderError::MissingCredentials("OPENAI_API_KEY"))?;

        Ok(Self {
            client: http::client_with_timeout(config.timeout_secs)?,
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_retries: config.max_retries,
        })
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize, Default)]
struct Usage {
    #[serde(default)]
    total_tokens: u32,
}

#[async_trait]
impl CompletionProvider for OpenAiCompletions {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion, ProviderError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        let json = http::send_with_retry("openai completions", self.max_retries, || {
            self.client
                .post("https://api.openai.com/v1/chat/completions")
                .bearer_auth(&self.api_key)
                .json(&body)
        })
        .await?;

        let parsed: ChatResponse =
            serde_json::from_value(json).map_err(|e| ProviderError::InvalidResponse {
                provider: "openai completions",
                detail: e.to_string(),
            })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse {
                provider: "openai completions",
                detail: "no choices in response".to_string(),
            })?;

        Ok(Completion {
            text: choice.message.content,
            total_tokens: parsed.usage.total_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parsing() {
        let json = serde_json::json!({
            "choices": [
                { "message": { "role": "assistant", "content": "Here's the real talk..." } }
            ],
            "usage": { "prompt_tokens": 900, "completion_tokens": 100, "total_tokens": 1000 }
        });
        let parsed: ChatResponse = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.choices[0].message.content, "Here's the real talk...");
        assert_eq!(parsed.usage.total_tokens, 1000);
    }

    #[test]
    fn test_missing_usage_defaults_to_zero() {
        let json = serde_json::json!({
            "choices": [ { "message": { "content": "hi" } } ]
        });
        let parsed: ChatResponse = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.usage.total_tokens, 0);
    }
}
