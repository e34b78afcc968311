//! Tests for extractor construction from configuration.

use taskmill::config::{AnthropicConfig, ExtractorConfig, OpenAiConfig};
use taskmill::extract::{self, ExtractionError};

#[test]
fn anthropic_provider_builds_when_credentials_exist() {
    let config = ExtractorConfig {
        anthropic: Some(AnthropicConfig {
            api_key: "sk-ant-test".to_owned(),
            model: "claude-sonnet-4-20250514".to_owned(),
        }),
        ..ExtractorConfig::default()
    };
    let extractor = extract::from_config(&config).expect("should build");
    assert_eq!(extractor.model_id(), "claude-sonnet-4-20250514");
}

#[test]
fn openai_provider_builds_when_credentials_exist() {
    let config = ExtractorConfig {
        provider: "openai".to_owned(),
        openai: Some(OpenAiConfig {
            base_url: "https://api.openai.com".to_owned(),
            api_key: "sk-test".to_owned(),
            model: "gpt-4o".to_owned(),
        }),
        ..ExtractorConfig::default()
    };
    let extractor = extract::from_config(&config).expect("should build");
    assert_eq!(extractor.model_id(), "gpt-4o");
}

#[test]
fn missing_credentials_are_reported_as_unavailable() {
    let config = ExtractorConfig::default();
    let err = extract::from_config(&config).expect_err("no credentials configured");
    assert!(matches!(err, ExtractionError::Unavailable(_)));
}

#[test]
fn unknown_provider_is_rejected() {
    let config = ExtractorConfig {
        provider: "cohere".to_owned(),
        ..ExtractorConfig::default()
    };
    let err = extract::from_config(&config).expect_err("unknown provider");
    let ExtractionError::Unavailable(message) = err else {
        panic!("expected Unavailable, got {err:?}");
    };
    assert!(message.contains("cohere"));
}
