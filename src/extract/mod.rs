//! LLM extraction client layer.
//!
//! Defines the [`TaskExtractor`] trait and the untrusted raw result types
//! returned by a completion service before sanitization.
//!
//! Two extractors are implemented:
//! - [`anthropic::AnthropicExtractor`] — Anthropic `/v1/messages` API
//! - [`openai::OpenAiExtractor`] — OpenAI-compatible `/v1/chat/completions` API
//!
//! [`from_config`] resolves the configured extractor. Raw output never flows
//! past [`sanitize::sanitize`] — the pipeline only persists sanitized tasks.

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ExtractorConfig;

pub mod anthropic;
pub mod openai;
pub mod sanitize;

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

/// System prompt for the extraction call. The output contract named here is
/// the shape [`parse_extraction_payload`] expects.
pub const EXTRACTION_SYSTEM_PROMPT: &str = "\
You are an expert task extraction assistant. Analyze the provided communication \
text and extract actionable tasks.

For each task, determine:
1. A clear, concise title (action-oriented)
2. A brief description (context from the original text)
3. Priority level (high/medium/low based on urgency indicators)
4. Assignee if mentioned
5. Due date if specified (return in ISO format)
6. Relevant tags (categories, topics, or keywords)

Also provide a brief summary of the communication.

Respond with JSON in this exact format:
{
  \"summary\": \"Brief summary of the communication\",
  \"tasks\": [
    {
      \"title\": \"Task title\",
      \"description\": \"Task description with context\",
      \"priority\": \"high|medium|low\",
      \"assignee\": \"Person name or null\",
      \"dueDate\": \"ISO date string or null\",
      \"tags\": [\"tag1\", \"tag2\"]
    }
  ]
}";

/// System prompt for the one-shot summary call.
pub const SUMMARY_SYSTEM_PROMPT: &str = "\
You are a professional communication summarizer. Create a concise, informative \
summary that captures the key points, decisions, and context of the provided text.";

/// Summary placeholder when the model returns none.
pub const NO_SUMMARY: &str = "No summary available";

/// Max tokens for an extraction completion.
pub const EXTRACTION_MAX_TOKENS: u32 = 2000;

/// Max tokens for a summary completion.
pub const SUMMARY_MAX_TOKENS: u32 = 200;

/// Build the user message for an extraction call.
pub fn extraction_user_message(text: &str) -> String {
    format!("Extract actionable tasks from this communication:\n\n{text}")
}

/// Build the user message for a summary call.
pub fn summary_user_message(text: &str) -> String {
    format!("Summarize this communication:\n\n{text}")
}

// ---------------------------------------------------------------------------
// Untrusted result types
// ---------------------------------------------------------------------------

/// One task as returned by the model — an arbitrary JSON value.
///
/// Deliberately opaque: no field of a raw task may be read outside
/// [`sanitize`]. Use [`RawTask::from_json`] in tests to build fixtures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawTask(pub(crate) Value);

impl RawTask {
    /// Wrap a JSON value as an untrusted task.
    pub fn from_json(value: Value) -> Self {
        Self(value)
    }
}

/// The parsed (but not yet sanitized) result of an extraction call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawExtraction {
    /// Communication summary. Already defaulted to [`NO_SUMMARY`] when the
    /// model omitted it — per the client contract the summary is a plain
    /// string, only the task list stays untrusted.
    pub summary: String,
    /// Untrusted task records, in model order.
    pub tasks: Vec<RawTask>,
}

/// Parse a completion's text payload into a [`RawExtraction`].
///
/// Models occasionally wrap the JSON object in prose or a code fence, so the
/// payload is sliced from the first `{` to the last `}` before parsing.
/// A `summary` that is missing or not a string becomes [`NO_SUMMARY`]; a
/// `tasks` that is missing or not an array becomes the empty list.
///
/// # Errors
///
/// Returns [`ExtractionError::Parse`] if no JSON value can be parsed at all.
pub fn parse_extraction_payload(payload: &str) -> Result<RawExtraction, ExtractionError> {
    let trimmed = payload.trim();
    let json_text = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    };

    let value: Value = serde_json::from_str(json_text)
        .map_err(|e| ExtractionError::Parse(format!("extraction response is not JSON: {e}")))?;

    let summary = match value.get("summary").and_then(Value::as_str) {
        Some(s) if !s.is_empty() => s.to_owned(),
        _ => NO_SUMMARY.to_owned(),
    };

    let tasks = match value.get("tasks").and_then(Value::as_array) {
        Some(items) => items.iter().cloned().map(RawTask).collect(),
        None => Vec::new(),
    };

    Ok(RawExtraction { summary, tasks })
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by extraction clients.
///
/// All variants are terminal for the request — no retry happens inside this
/// layer; retry policy belongs to the caller.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// HTTP transport failure (network, TLS, timeout).
    #[error("extraction request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Response did not match the expected shape.
    #[error("extraction response parse error: {0}")]
    Parse(String),
    /// Upstream service responded with an error status.
    #[error("extraction service returned status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Redacted response body.
        body: String,
    },
    /// No extractor can be built from the current configuration.
    #[error("extractor unavailable: {0}")]
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// HTTP helpers (shared by both extractors)
// ---------------------------------------------------------------------------

/// Check HTTP response status and return the body text or a structured error.
///
/// # Errors
///
/// Returns `ExtractionError::Request` on transport failure,
/// `ExtractionError::HttpStatus` on non-2xx.
pub async fn check_http_response(response: reqwest::Response) -> Result<String, ExtractionError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ExtractionError::HttpStatus {
            status: status.as_u16(),
            body: redact_error_body(&body),
        });
    }
    Ok(body)
}

fn redact_error_body(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut redacted = collapsed;
    for pattern in [
        r"sk-ant-[A-Za-z0-9_\-]{10,}",
        r"sk-[A-Za-z0-9]{32,}",
        r"Bearer [A-Za-z0-9_\-\.]{16,}",
    ] {
        if let Ok(regex) = Regex::new(pattern) {
            redacted = regex.replace_all(&redacted, "[REDACTED]").into_owned();
        }
    }

    const MAX_ERROR_BODY_CHARS: usize = 256;
    if redacted.chars().count() > MAX_ERROR_BODY_CHARS {
        let shortened = redacted
            .chars()
            .take(MAX_ERROR_BODY_CHARS)
            .collect::<String>();
        return format!("{shortened}...[truncated]");
    }

    redacted
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// An extraction-capable completion service.
///
/// Implementations must be `Send + Sync`; the pipeline holds one behind an
/// `Arc<dyn TaskExtractor>` so tests can substitute a scripted fake.
#[async_trait]
pub trait TaskExtractor: Send + Sync + std::fmt::Debug {
    /// Extract a summary and raw task list from free-form text.
    ///
    /// The caller guarantees `text` is non-empty after trimming.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError`] on network, auth, or parse failure.
    async fn extract(&self, text: &str) -> Result<RawExtraction, ExtractionError>;

    /// Produce a standalone summary of the text.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError`] on network, auth, or parse failure.
    async fn summarize(&self, text: &str) -> Result<String, ExtractionError>;

    /// The model identifier string this extractor is instantiated for.
    fn model_id(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Build the extractor selected by configuration.
///
/// # Errors
///
/// Returns [`ExtractionError::Unavailable`] when the selected provider has no
/// credentials configured, and [`ExtractionError::Request`] if the HTTP
/// client cannot be constructed.
pub fn from_config(config: &ExtractorConfig) -> Result<Arc<dyn TaskExtractor>, ExtractionError> {
    match config.provider.as_str() {
        "anthropic" => {
            let creds = config.anthropic.as_ref().ok_or_else(|| {
                ExtractionError::Unavailable(
                    "provider is 'anthropic' but [extractor.anthropic] is not configured".to_owned(),
                )
            })?;
            Ok(Arc::new(anthropic::AnthropicExtractor::new(
                creds.clone(),
                config.max_tokens,
                config.timeout_seconds,
            )?))
        }
        "openai" => {
            let creds = config.openai.as_ref().ok_or_else(|| {
                ExtractionError::Unavailable(
                    "provider is 'openai' but [extractor.openai] is not configured".to_owned(),
                )
            })?;
            Ok(Arc::new(openai::OpenAiExtractor::new(
                creds.clone(),
                config.max_tokens,
                config.timeout_seconds,
            )?))
        }
        other => Err(ExtractionError::Unavailable(format!(
            "unknown extractor provider {other:?}, expected 'anthropic' or 'openai'"
        ))),
    }
}
