//! Async LLM client used by the remote classification stage
//!
//! Model-agnostic HTTP client for chat-completion APIs. Supports both the
//! Anthropic messages format and OpenAI-compatible endpoints (DeepSeek,
//! local servers, etc).

use crate::core::config::LlmSettings;
use crate::core::error::{Result, ZeroError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Classification answers are a single small JSON object
const MAX_TOKENS: u32 = 256;

/// API format type
#[derive(Debug, Clone, PartialEq)]
pub enum ApiFormat {
    Anthropic,
    OpenAI,
}

/// Async LLM client for making API calls
pub struct LlmClient {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
    api_format: ApiFormat,
}

impl LlmClient {
    /// Create a new LLM client with explicit configuration
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        let api_format = Self::detect_api_format(&api_url);
        Self {
            client: Client::new(),
            api_key,
            api_url,
            model,
            api_format,
        }
    }

    /// Detect API format from URL
    fn detect_api_format(url: &str) -> ApiFormat {
        if url.contains("anthropic.com") {
            ApiFormat::Anthropic
        } else {
            ApiFormat::OpenAI
        }
    }

    /// Create a client from environment variables
    ///
    /// Required: LLM_API_KEY
    /// Optional: LLM_API_URL (defaults to Anthropic API)
    /// Optional: LLM_MODEL (defaults to claude-3-haiku-20240307)
    pub fn from_env() -> Result<Self> {
        let defaults = LlmSettings::default();
        let settings = LlmSettings {
            api_url: std::env::var("LLM_API_URL").unwrap_or(defaults.api_url),
            model: std::env::var("LLM_MODEL").unwrap_or(defaults.model),
            api_key_env: defaults.api_key_env,
        };
        Self::from_settings(&settings)
    }

    /// Create a client from configuration, reading the key from the
    /// configured environment variable
    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        let api_key = std::env::var(&settings.api_key_env)
            .map_err(|_| ZeroError::LlmError(format!("{} not set", settings.api_key_env)))?;
        Ok(Self::new(api_key, settings.api_url.clone(), settings.model.clone()))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn api_format(&self) -> &ApiFormat {
        &self.api_format
    }

    /// Send a completion request to the LLM
    ///
    /// # Arguments
    /// * `system` - System prompt providing instructions
    /// * `user` - User message to process
    /// * `timeout` - Upper bound for the whole HTTP exchange
    pub async fn complete(&self, system: &str, user: &str, timeout: Duration) -> Result<String> {
        match self.api_format {
            ApiFormat::Anthropic => self.complete_anthropic(system, user, timeout).await,
            ApiFormat::OpenAI => self.complete_openai(system, user, timeout).await,
        }
    }

    async fn complete_anthropic(
        &self,
        system: &str,
        user: &str,
        timeout: Duration,
    ) -> Result<String> {
        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            system: system.into(),
            messages: vec![Message {
                role: "user".into(),
                content: user.into(),
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .timeout(timeout)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ZeroError::LlmError(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ZeroError::LlmError(format!("API error: {}", error_text)));
        }

        let completion: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| ZeroError::LlmError(e.to_string()))?;

        completion
            .content
            .first()
            .map(|c| c.text.clone())
            .ok_or_else(|| ZeroError::LlmError("Empty response".into()))
    }

    async fn complete_openai(&self, system: &str, user: &str, timeout: Duration) -> Result<String> {
        let request = OpenAIRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            temperature: 0.0,
            messages: vec![
                Message {
                    role: "system".into(),
                    content: system.into(),
                },
                Message {
                    role: "user".into(),
                    content: user.into(),
                },
            ],
        };

        let response = self
            .client
            .post(&self.api_url)
            .timeout(timeout)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ZeroError::LlmError(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ZeroError::LlmError(format!("API error: {}", error_text)));
        }

        let completion: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| ZeroError::LlmError(e.to_string()))?;

        completion
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| ZeroError::LlmError("Empty response".into()))
    }
}

// Anthropic API format
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

// OpenAI-compatible API format
#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = LlmClient::new(
            "test-key".into(),
            "https://api.example.com/v1/chat/completions".into(),
            "test-model".into(),
        );
        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.model(), "test-model");
        assert_eq!(client.api_format(), &ApiFormat::OpenAI);
    }

    #[test]
    fn test_anthropic_format_detected() {
        let client = LlmClient::new(
            "k".into(),
            "https://api.anthropic.com/v1/messages".into(),
            "m".into(),
        );
        assert_eq!(client.api_format(), &ApiFormat::Anthropic);
    }

    #[test]
    fn test_from_settings_missing_key() {
        let settings = LlmSettings {
            api_key_env: "ZERO_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..LlmSettings::default()
        };
        let err = LlmClient::from_settings(&settings).err().unwrap();
        assert!(err.to_string().contains("ZERO_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_request_serialization() {
        let request = OpenAIRequest {
            model: "m".into(),
            max_tokens: MAX_TOKENS,
            temperature: 0.0,
            messages: vec![Message {
                role: "user".into(),
                content: "hi".into(),
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 256);
    }
}
