//! Prompting and response parsing for remote intent classification
//!
//! The model only names an intent from the local catalogue and a
//! confidence. Entities always come from the local extractor.

use crate::core::error::{Result, ZeroError};
use crate::core::types::{clamp_confidence, UNKNOWN_INTENT};
use crate::llm::client::LlmClient;
use crate::nlu::rules::{describe_intent, INTENT_RULES};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Remote model's answer for one utterance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteVerdict {
    pub intent: String,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub reasoning: Option<String>,
}

impl RemoteVerdict {
    /// Clamp confidence and fold labels outside the catalogue into "unknown"
    pub fn normalized(mut self) -> Self {
        self.confidence = clamp_confidence(self.confidence);
        if self.intent != UNKNOWN_INTENT && describe_intent(&self.intent).is_none() {
            tracing::debug!("Remote classifier proposed unlisted intent '{}'", self.intent);
            self.intent = UNKNOWN_INTENT.to_string();
            self.confidence = 0.0;
        }
        self
    }
}

/// Ask the model to classify one utterance
///
/// # Arguments
/// * `client` - The LLM client to use
/// * `input` - The user's utterance
/// * `context_summary` - Short description of the conversation so far
/// * `timeout` - Upper bound for the HTTP exchange
pub async fn classify_utterance(
    client: &LlmClient,
    input: &str,
    context_summary: &str,
    timeout: Duration,
) -> Result<RemoteVerdict> {
    let system_prompt = classification_prompt();
    let user_prompt = format!(
        "CONTEXT:\n{}\n\nUSER INPUT:\n{}\n\nClassify this utterance into JSON:",
        context_summary, input
    );

    let response = client.complete(&system_prompt, &user_prompt, timeout).await?;
    parse_verdict(&response)
}

/// Parse a model response into a normalized verdict
pub fn parse_verdict(response: &str) -> Result<RemoteVerdict> {
    let json_str = extract_json(response)?;
    let verdict: RemoteVerdict = serde_json::from_str(json_str).map_err(|e| {
        ZeroError::LlmError(format!(
            "Failed to parse verdict: {} - Response: {}",
            e, response
        ))
    })?;
    Ok(verdict.normalized())
}

/// Extract JSON object from LLM response (handles surrounding text)
pub fn extract_json(response: &str) -> Result<&str> {
    let start = response
        .find('{')
        .ok_or_else(|| ZeroError::LlmError("No JSON found in response".into()))?;
    let end = response
        .rfind('}')
        .ok_or_else(|| ZeroError::LlmError("No closing brace found in response".into()))?;
    if end < start {
        return Err(ZeroError::LlmError("Malformed JSON in response".into()));
    }
    Ok(&response[start..=end])
}

/// System prompt listing every intent the assistant can route
pub fn classification_prompt() -> String {
    let mut prompt = String::from(
        "You classify user requests for a voice assistant.\n\
         Pick exactly one intent from the list below, or \"unknown\" if none fits.\n\n\
         AVAILABLE INTENTS:\n",
    );
    for rule in INTENT_RULES {
        prompt.push_str(&format!("- {}: {}\n", rule.intent, rule.description));
    }
    prompt.push_str(CLASSIFY_OUTPUT_FORMAT);
    prompt
}

const CLASSIFY_OUTPUT_FORMAT: &str = r#"
OUTPUT FORMAT (JSON only, no explanation):
{
  "intent": "namespace.action or unknown",
  "confidence": 0.0-1.0,
  "reasoning": "one short sentence"
}

Examples:
"wake me in twenty minutes" -> {"intent": "timer.set", "confidence": 0.9, "reasoning": "relative alarm request"}
"do I need an umbrella in Oslo" -> {"intent": "weather.query", "confidence": 0.85, "reasoning": "asks about rain"}
"fly me to the moon" -> {"intent": "unknown", "confidence": 0.2, "reasoning": "not an assistant capability"}
"#;
