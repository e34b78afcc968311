//! Anthropic extractor implementation using the `/v1/messages` API.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::AnthropicConfig;

use super::{
    check_http_response, extraction_user_message, parse_extraction_payload, summary_user_message,
    ExtractionError, RawExtraction, TaskExtractor, EXTRACTION_MAX_TOKENS, EXTRACTION_SYSTEM_PROMPT,
    NO_SUMMARY, SUMMARY_MAX_TOKENS, SUMMARY_SYSTEM_PROMPT,
};

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// Anthropic messages API request body.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct AnthropicRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<AnthropicMessage>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// System prompt.
    pub system: String,
}

/// A message in Anthropic format.
#[doc(hidden)]
#[derive(Debug, Serialize, Deserialize)]
pub struct AnthropicMessage {
    /// Role: "user" or "assistant".
    pub role: String,
    /// Plain text content.
    pub content: String,
}

/// Anthropic API response body.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct AnthropicResponse {
    /// Content blocks in the response.
    pub content: Vec<AnthropicContentBlock>,
}

/// A content block in the Anthropic response.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnthropicContentBlock {
    /// Text content.
    Text {
        /// The text.
        text: String,
    },
    /// Any non-text block (ignored).
    #[serde(other)]
    Other,
}

/// Extract the concatenated text of an Anthropic response body.
///
/// # Errors
///
/// Returns `ExtractionError::Parse` if the body cannot be deserialized.
#[doc(hidden)]
pub fn response_text(body: &str) -> Result<String, ExtractionError> {
    let resp: AnthropicResponse =
        serde_json::from_str(body).map_err(|e| ExtractionError::Parse(e.to_string()))?;

    Ok(resp
        .content
        .into_iter()
        .filter_map(|block| match block {
            AnthropicContentBlock::Text { text } => Some(text),
            AnthropicContentBlock::Other => None,
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// Anthropic messages API extractor.
#[derive(Debug, Clone)]
pub struct AnthropicExtractor {
    model: String,
    api_key: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl AnthropicExtractor {
    /// Create a new Anthropic extractor.
    ///
    /// The request timeout applies to the whole call; a timed-out call
    /// surfaces as [`ExtractionError::Request`].
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Request`] if the HTTP client cannot be
    /// constructed.
    pub fn new(
        config: AnthropicConfig,
        max_tokens: u32,
        timeout_seconds: u64,
    ) -> Result<Self, ExtractionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;
        Ok(Self {
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
        let request = AnthropicRequest {
            model: self.model.clone(),
            messages: vec![AnthropicMessage {
                role: "user".to_owned(),
                content: user_content,
            }],
            max_tokens,
            system: system.to_owned(),
        };

        let response = self
            .client
            .post(ANTHROPIC_API_BASE)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let payload = check_http_response(response).await?;
        response_text(&payload)
    }
}

#[async_trait::async_trait]
impl TaskExtractor for AnthropicExtractor {
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
