//! AI assistant client.
//!
//! Forwards chat turns to an OpenAI-compatible chat-completions endpoint
//! so the provider key stays on the server.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::AssistantConfig;
use crate::fees::{format_currency, FeeSchedule};

const SYSTEM_PROMPT: &str = "You are the Knit Edu parent portal assistant. You help parents with \
school fees, re-registration, payment plans and school notices. Keep answers concise and \
actionable. If you are unsure, say so and point the parent to the school's finance office.";

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("{message}")]
    Provider { status: u16, message: String },

    #[error("Request to AI provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response from AI provider: {0}")]
    Decode(String),
}

/// One turn of a conversation, in the wire format the provider expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ChatTurn,
}

pub struct AssistantClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AssistantClient {
    /// Returns None when no API key is configured; the chat endpoint is
    /// disabled in that case.
    pub fn from_config(config: &AssistantConfig) -> anyhow::Result<Option<Self>> {
        let Some(api_key) = config.api_key.clone() else {
            return Ok(None);
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Some(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }))
    }

    /// Sends the conversation (system prompt prepended) and returns the
    /// assistant's reply text.
    pub async fn chat(
        &self,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<String, AssistantError> {
        let mut messages = vec![ChatTurn {
            role: "system".to_string(),
            content: SYSTEM_PROMPT.to_string(),
        }];
        messages.extend_from_slice(history);
        messages.push(ChatTurn::user(message));

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "model": self.model,
                "max_tokens": self.max_tokens,
                "messages": messages,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| {
                    v.pointer("/error/message")
                        .and_then(|m| m.as_str())
                        .map(|m| m.to_string())
                })
                .unwrap_or_else(|| format!("AI provider returned status {}", status));
            return Err(AssistantError::Provider { status, message });
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::Decode(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AssistantError::Decode("response contained no choices".to_string()))
    }
}

/// Builds the billing-analysis prompt for a fee schedule.
pub fn billing_insights_prompt(schedule: &FeeSchedule) -> String {
    format!(
        "Analyze this billing data and provide a concise financial summary:\n\n\
         Student: {}\n\
         Total Fees: {}\n\
         Paid Amount: {}\n\
         Outstanding Amount: {}\n\n\
         Fee Breakdown:\n\
         - Annual Fees: {}\n\
         - Term Fees: {}\n\
         - Sport Fees: {}\n\
         - Registration Fee: {}\n\
         - Re-registration Fee: {}\n\n\
         Please provide:\n\
         1. A brief financial status summary\n\
         2. Recommended payment plan\n\
         3. Key action items for the parent\n\n\
         Keep the response concise and actionable.",
        schedule.student_name,
        format_currency(schedule.total_fees),
        format_currency(schedule.paid_amount),
        format_currency(schedule.outstanding_amount),
        format_currency(schedule.annual_fees),
        format_currency(schedule.term_fees),
        format_currency(schedule.sport_fees),
        format_currency(schedule.registration_fee),
        format_currency(schedule.re_registration_fee),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssistantConfig;

    #[test]
    fn disabled_without_api_key() {
        let client = AssistantClient::from_config(&AssistantConfig::default()).unwrap();
        assert!(client.is_none());
    }

    #[test]
    fn enabled_with_api_key() {
        let config = AssistantConfig {
            api_key: Some("sk-test".to_string()),
            ..AssistantConfig::default()
        };
        let client = AssistantClient::from_config(&config).unwrap();
        assert!(client.is_some());
    }

    #[test]
    fn insights_prompt_includes_the_figures() {
        let prompt = billing_insights_prompt(&FeeSchedule::sample());
        assert!(prompt.contains("Mikhenso Rikhotso"));
        assert!(prompt.contains("R 42 000.00"));
        assert!(prompt.contains("Recommended payment plan"));
    }
}
