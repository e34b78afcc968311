//! OpenAI-compatible extractor using the `/v1/chat/completions` API.
//!
//! Works against api.openai.com or any compatible server (the base URL is
//! configurable), which keeps the pipeline testable against local models.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::OpenAiConfig;

use super::{
    check_http_response, extraction_user_message, parse_extraction_payload, summary_user_message,
    ExtractionError, RawExtraction, TaskExtractor, EXTRACTION_MAX_TOKENS, EXTRACTION_SYSTEM_PROMPT,
    NO_SUMMARY, SUMMARY_MAX_TOKENS, SUMMARY_SYSTEM_PROMPT,
};

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// OpenAI chat completions API request body.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct OpenAiRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<OpenAiMessage>,
    /// Maximum completion tokens.
    pub max_tokens: u32,
}

/// A message in OpenAI chat format.
#[doc(hidden)]
#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAiMessage {
    /// Role (`system` or `user`).
    pub role: String,
    /// Plain text content.
    pub content: String,
}

/// OpenAI chat completions API response body.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct OpenAiResponse {
    /// Response choices.
    pub choices: Vec<OpenAiChoice>,
}

/// A response choice from OpenAI.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct OpenAiChoice {
    /// Assistant message for this choice.
    pub message: OpenAiResponseMessage,
}

/// Assistant message from OpenAI.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct OpenAiResponseMessage {
    /// Optional text content.
    pub content: Option<String>,
}

/// Extract the first choice's text from an OpenAI response body.
///
/// # Errors
///
/// Returns `ExtractionError::Parse` if the body cannot be deserialized or
/// contains no choices.
#[doc(hidden)]
pub fn response_text(body: &str) -> Result<String, ExtractionError> {
    let resp: OpenAiResponse =
        serde_json::from_str(body).map_err(|e| ExtractionError::Parse(e.to_string()))?;

    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ExtractionError::Parse("response contained no choices".to_owned()))?;

    Ok(choice.message.content.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// OpenAI-compatible chat completions extractor.
#[derive(Debug, Clone)]
pub struct OpenAiExtractor {
    base_url: String,
    model: String,
    api_key: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl OpenAiExtractor {
    /// Create a new OpenAI-compatible extractor.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Request`] if the HTTP client cannot be
    /// constructed.
    pub fn new(
        config: OpenAiConfig,
        max_tokens: u32,
        timeout_seconds: u64,
    ) -> Result<Self, ExtractionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            model: config.model,
            api_key: config.api_key,
            max_tokens,
            client,
        })
    }

    async fn complete(
        &self,
        system: &str,
        user_content: String,
        max_tokens: u32,
    ) -> Result<String, ExtractionError> {
        let request = OpenAiRequest {
            model: self.model.clone(),
            messages: vec![
                OpenAiMessage {
                    role: "system".to_owned(),
                    content: system.to_owned(),
                },
                OpenAiMessage {
                    role: "user".to_owned(),
                    content: user_content,
                },
            ],
            max_tokens,
        };

        let url = format!("{}{CHAT_COMPLETIONS_PATH}", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let payload = check_http_response(response).await?;
        response_text(&payload)
    }
}

#[async_trait::async_trait]
impl TaskExtractor for OpenAiExtractor {
    async fn extract(&self, text: &str) -> Result<RawExtraction, ExtractionError> {
        let payload = self
            .complete(
                EXTRACTION_SYSTEM_PROMPT,
                extraction_user_message(text),
                self.max_tokens.min(EXTRACTION_MAX_TOKENS),
            )
            .await?;
        parse_extraction_payload(&payload)
    }

    async fn summarize(&self, text: &str) -> Result<String, ExtractionError> {
        let summary = self
            .complete(
                SUMMARY_SYSTEM_PROMPT,
                summary_user_message(text),
                SUMMARY_MAX_TOKENS,
            )
            .await?;
        if summary.is_empty() {
            return Ok(NO_SUMMARY.to_owned());
        }
        Ok(summary)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
