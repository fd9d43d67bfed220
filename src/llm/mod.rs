//! LLM module for ideaspot
//!
//! Single-prompt completions against hosted model APIs (Anthropic, Gemini).

mod anthropic;
mod client;
mod gemini;

pub use anthropic::AnthropicClient;
pub use client::{build_provider, Completion, CompletionRequest, LlmProvider, TokenUsage};
pub use gemini::GeminiClient;
