//! Chat-completion client for word definitions and section summaries.
//!
//! The endpoint is treated as an opaque `complete(prompt, system) -> text`
//! capability: one POST carrying a system instruction and a user prompt, one
//! text payload back. Failures never reach the UI shell; callers degrade to a
//! fixed human-readable message inside the popup.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::AssistantConfig;

/// Longest section text sent to the summary prompt.
pub const SUMMARY_CHAR_CAP: usize = 5000;

/// Shown in the popup when a capability call fails, whatever the cause.
pub const LOOKUP_FAILED: &str =
    "Failed to get a response from the assistant. Please try again.";

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("no API credential configured")]
    MissingCredential,
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("service returned HTTP {status}: {body}")]
    Service { status: u16, body: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Thin client over the chat-completion endpoint. Cheap to clone; clones
/// share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Assistant {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl Assistant {
    pub fn from_config(config: &AssistantConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .unwrap_or_default();
        let api_key = if config.api_key.is_empty() {
            std::env::var("MISTRAL_API_KEY").unwrap_or_default()
        } else {
            config.api_key.clone()
        };
        Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
        }
    }

    pub fn has_credential(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// One round-trip: system instruction plus user prompt in, text out.
    pub async fn complete(
        &self,
        prompt: &str,
        system_prompt: &str,
    ) -> Result<String, AssistantError> {
        if self.api_key.is_empty() {
            return Err(AssistantError::MissingCredential);
        }

        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        debug!(
            endpoint = %self.endpoint,
            model = %self.model,
            prompt_chars = prompt.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let payload: ChatResponse = serde_json::from_str(&body)
            .map_err(|err| AssistantError::MalformedResponse(err.to_string()))?;
        payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AssistantError::MalformedResponse("empty choices".to_string()))
    }

    /// Define a clicked word. Punctuation is stripped before the word reaches
    /// the prompt, so "thirteen." queries "thirteen".
    pub async fn define_word(&self, word: &str) -> Result<String, AssistantError> {
        let clean = clean_word(word);
        let prompt = format!("Define the word \"{clean}\" in one sentence.");
        self.complete(
            &prompt,
            "You are a helpful dictionary assistant. Provide concise, clear definitions.",
        )
        .await
    }

    /// Summarize a closed section, capped at [`SUMMARY_CHAR_CAP`] characters
    /// to bound request size.
    pub async fn summarize_section(&self, text: &str) -> Result<String, AssistantError> {
        let truncated = truncate_chars(text, SUMMARY_CHAR_CAP);
        let prompt = format!("Summarize the following text in 7-8 sentences:\n\n{truncated}");
        self.complete(
            &prompt,
            "You are a helpful reading assistant. Provide clear, concise summaries.",
        )
        .await
    }
}

/// Strip everything except word characters from a clicked token.
pub fn clean_word(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

/// Truncate to at most `cap` characters, respecting char boundaries.
pub fn truncate_chars(text: &str, cap: usize) -> &str {
    match text.char_indices().nth(cap) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
