use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;

use crate::config::Settings;
use crate::llm::anthropic::AnthropicClient;
use crate::llm::gemini::GeminiClient;
use crate::{IdeaSpotError, UpstreamKind};

/// Single-prompt completion request.
pub struct CompletionRequest<'a> {
    pub prompt: &'a str,
    pub max_tokens: u32,
}

/// Text returned by a provider, with whatever accounting it reported.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub model: String,
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name used in logs and errors.
    fn name(&self) -> &str;

    /// Model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Send one prompt and wait for the whole completion.
    async fn complete(&self, request: CompletionRequest<'_>) -> crate::Result<Completion>;
}

/// Build an LLM provider from runtime settings.
pub fn build_provider(settings: &Settings) -> Result<Arc<dyn LlmProvider>> {
    match settings.llm.provider.to_lowercase().as_str() {
        "anthropic" => Ok(Arc::new(AnthropicClient::from_settings(settings)?)),
        "gemini" => Ok(Arc::new(GeminiClient::from_settings(settings)?)),
        other => anyhow::bail!(
            "Unsupported llm.provider '{}'. Supported providers: anthropic, gemini",
            other
        ),
    }
}

/// Map a transport-level reqwest failure to an upstream error.
pub(crate) fn transport_error(provider: &str, err: reqwest::Error) -> IdeaSpotError {
    let kind = if err.is_decode() {
        UpstreamKind::Decode
    } else {
        UpstreamKind::Network
    };

    IdeaSpotError::UpstreamFailure {
        provider: provider.to_string(),
        kind,
        message: err.without_url().to_string(),
    }
}

/// Map a non-success HTTP status (and its body) to an upstream error.
pub(crate) fn status_error(provider: &str, status: StatusCode, body: &str) -> IdeaSpotError {
    let kind = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => UpstreamKind::Authentication,
        StatusCode::TOO_MANY_REQUESTS => UpstreamKind::RateLimited,
        other => UpstreamKind::Status(other.as_u16()),
    };

    let detail = error_detail(body);
    let message = if detail.is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, detail)
    };

    IdeaSpotError::UpstreamFailure {
        provider: provider.to_string(),
        kind,
        message,
    }
}

/// Pull `error.message` out of a provider error body, falling back to the raw text.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().chars().take(200).collect())
}
