//! Transcript to structured expansion, via one model call

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::config::Settings;
use crate::expansion::catalog::SectionCatalog;
use crate::expansion::preprocess::{preprocess_transcript, MAX_TRANSCRIPT_CHARS};
use crate::expansion::prompts::build_expansion_prompt;
use crate::expansion::sanitize::strip_code_fence;
use crate::expansion::types::{
    Expansion, ExpansionResult, MISSING_SECTION_CONTENT, MISSING_TITLE,
};
use crate::llm::{build_provider, CompletionRequest, LlmProvider};
use crate::{IdeaSpotError, Result};

/// Default output-token ceiling for one expansion.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Expands transcripts into titled, ordered sections.
///
/// Holds no per-call state; one instance can serve concurrent calls.
pub struct Expander {
    provider: Arc<dyn LlmProvider>,
    catalog: SectionCatalog,
    max_tokens: u32,
    max_transcript_chars: usize,
}

impl Expander {
    pub fn new(provider: Arc<dyn LlmProvider>, catalog: SectionCatalog) -> Self {
        Self {
            provider,
            catalog,
            max_tokens: DEFAULT_MAX_TOKENS,
            max_transcript_chars: MAX_TRANSCRIPT_CHARS,
        }
    }

    /// Build the configured provider and catalog.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let catalog = settings.expansion.catalog()?;
        let provider = build_provider(settings)?;

        Ok(Self::new(provider, catalog)
            .with_max_tokens(settings.llm.max_tokens)
            .with_max_transcript_chars(settings.expansion.max_transcript_chars))
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_max_transcript_chars(mut self, max_chars: usize) -> Self {
        self.max_transcript_chars = max_chars;
        self
    }

    pub fn catalog(&self) -> &SectionCatalog {
        &self.catalog
    }

    pub fn max_transcript_chars(&self) -> usize {
        self.max_transcript_chars
    }

    /// Expand one transcript. The model is called exactly once; failures are not retried.
    pub async fn expand(&self, transcript: &str) -> Result<ExpansionResult> {
        let transcript = preprocess_transcript(transcript, self.max_transcript_chars)?;

        info!(
            provider = self.provider.name(),
            model = self.provider.model(),
            transcript_chars = transcript.chars().count(),
            "Processing idea expansion"
        );
        debug!(transcript, "Transcript to expand");

        let prompt = build_expansion_prompt(transcript, &self.catalog);
        let completion = self
            .provider
            .complete(CompletionRequest {
                prompt: &prompt,
                max_tokens: self.max_tokens,
            })
            .await
            .map_err(|e| {
                error!(
                    provider = self.provider.name(),
                    model = self.provider.model(),
                    error = %e,
                    "Model call failed"
                );
                e
            })?;

        debug!(response = %completion.text, "Received model response");

        let sanitized = strip_code_fence(&completion.text);
        let parsed: Value = match serde_json::from_str(sanitized) {
            Ok(value) => value,
            Err(e) => {
                error!(
                    raw = %completion.text,
                    sanitized,
                    error = %e,
                    "Failed to parse model response as JSON"
                );
                return Err(IdeaSpotError::MalformedResponse(format!(
                    "response is not valid JSON: {}",
                    e
                )));
            }
        };

        let Value::Object(object) = parsed else {
            error!(
                raw = %completion.text,
                sanitized,
                "Model response JSON is not an object"
            );
            return Err(IdeaSpotError::MalformedResponse(
                "response JSON is not an object".to_string(),
            ));
        };

        let result = map_response(&object, &self.catalog);

        info!(
            model = %completion.model,
            title = %result.title,
            sections = result.expansions.len(),
            input_tokens = completion.usage.map(|u| u.input_tokens),
            output_tokens = completion.usage.map(|u| u.output_tokens),
            "Idea expansion complete"
        );

        Ok(result)
    }
}

/// Map a parsed reply onto the catalog, one entry per section, in catalog order.
///
/// Missing, empty or non-string fields get placeholders; this never fails.
pub fn map_response(parsed: &Map<String, Value>, catalog: &SectionCatalog) -> ExpansionResult {
    let sections = parsed.get("sections").and_then(Value::as_object);
    if sections.is_none() {
        warn!("Model response has no sections object");
    }

    let expansions = catalog
        .iter()
        .map(|spec| {
            let content = match sections.and_then(|s| non_blank(s.get(&spec.key))) {
                Some(text) => text.to_string(),
                None => {
                    warn!(section = %spec.key, "Section not generated");
                    MISSING_SECTION_CONTENT.to_string()
                }
            };

            Expansion {
                section_title: spec.title.clone(),
                content,
            }
        })
        .collect();

    let title = non_blank(parsed.get("title"))
        .unwrap_or(MISSING_TITLE)
        .to_string();

    ExpansionResult { title, expansions }
}

fn non_blank(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expansion::catalog::SectionSpec;
    use crate::llm::Completion;
    use crate::UpstreamKind;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Replays a canned reply and records the prompts it was sent.
    struct ScriptedProvider {
        reply: std::result::Result<String, UpstreamKind>,
        prompts: Mutex<Vec<(String, u32)>>,
    }

    impl ScriptedProvider {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing(kind: UpstreamKind) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(kind),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted-1"
        }

        async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion> {
            self.prompts
                .lock()
                .unwrap()
                .push((request.prompt.to_string(), request.max_tokens));

            match &self.reply {
                Ok(text) => Ok(Completion {
                    text: text.clone(),
                    model: "scripted-1".to_string(),
                    usage: None,
                }),
                Err(kind) => Err(IdeaSpotError::UpstreamFailure {
                    provider: "scripted".to_string(),
                    kind: *kind,
                    message: "scripted failure".to_string(),
                }),
            }
        }
    }

    fn full_reply() -> Value {
        json!({
            "title": "WalkMate",
            "sections": {
                "problemPainPoint": "Busy owners cannot walk dogs midday.",
                "targetCustomer": "Urban professionals with dogs.",
                "marketSize": "Pet services are a large market.",
                "validationPlan": "Landing page with waitlist.",
                "firstSteps": "Recruit five walkers.",
                "nameOptions": "• WalkMate\n• Pawsome\n• LeashLink\n• StrideDog\n• BarkBuddy"
            }
        })
    }

    #[tokio::test]
    async fn maps_complete_reply_in_catalog_order() {
        let provider = ScriptedProvider::replying(&full_reply().to_string());
        let expander = Expander::new(provider.clone(), SectionCatalog::default());

        let result = expander.expand("an app for dog walkers").await.unwrap();

        assert_eq!(result.title, "WalkMate");
        assert_eq!(result.expansions.len(), 6);
        for (expansion, spec) in result.expansions.iter().zip(SectionCatalog::default().iter()) {
            assert_eq!(expansion.section_title, spec.title);
            assert_eq!(
                expansion.content,
                full_reply()["sections"][&spec.key].as_str().unwrap()
            );
        }
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn missing_section_gets_placeholder() {
        let mut reply = full_reply();
        reply["sections"].as_object_mut().unwrap().remove("marketSize");
        let expander = Expander::new(
            ScriptedProvider::replying(&reply.to_string()),
            SectionCatalog::default(),
        );

        let result = expander.expand("idea").await.unwrap();

        assert_eq!(result.expansions[2].section_title, "Market Size/Opportunity");
        assert_eq!(result.expansions[2].content, MISSING_SECTION_CONTENT);
        assert_eq!(result.expansions[1].content, "Urban professionals with dogs.");
        assert_eq!(result.expansions[3].content, "Landing page with waitlist.");
    }

    #[tokio::test]
    async fn fenced_reply_parses_like_plain_reply() {
        let plain = full_reply().to_string();
        let fenced = format!("```json\n{}\n```", plain);

        let catalog = SectionCatalog::default();
        let from_plain = Expander::new(ScriptedProvider::replying(&plain), catalog.clone())
            .expand("idea")
            .await
            .unwrap();
        let from_fenced = Expander::new(ScriptedProvider::replying(&fenced), catalog)
            .expand("idea")
            .await
            .unwrap();

        assert_eq!(from_plain, from_fenced);
    }

    #[tokio::test]
    async fn invalid_json_is_malformed_response() {
        let expander = Expander::new(
            ScriptedProvider::replying("Sure! Here is your analysis: {title: WalkMate"),
            SectionCatalog::default(),
        );

        let err = expander.expand("idea").await.unwrap_err();
        assert!(matches!(err, IdeaSpotError::MalformedResponse(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn non_object_json_is_malformed_response() {
        let expander = Expander::new(
            ScriptedProvider::replying("[\"WalkMate\"]"),
            SectionCatalog::default(),
        );

        let err = expander.expand("idea").await.unwrap_err();
        assert!(matches!(err, IdeaSpotError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn blank_transcript_never_reaches_the_model() {
        let provider = ScriptedProvider::replying("{}");
        let expander = Expander::new(provider.clone(), SectionCatalog::default());

        let err = expander.expand("   \n").await.unwrap_err();
        assert!(matches!(err, IdeaSpotError::InvalidArgument(_)));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn oversized_transcript_respects_configured_limit() {
        let provider = ScriptedProvider::replying("{}");
        let expander =
            Expander::new(provider.clone(), SectionCatalog::default()).with_max_transcript_chars(10);

        let err = expander.expand("eleven char").await.unwrap_err();
        assert!(matches!(err, IdeaSpotError::InvalidArgument(_)));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn upstream_failure_is_surfaced_without_retry() {
        let provider = ScriptedProvider::failing(UpstreamKind::RateLimited);
        let expander = Expander::new(provider.clone(), SectionCatalog::default());

        let err = expander.expand("idea").await.unwrap_err();
        assert_eq!(err.upstream_kind(), Some(UpstreamKind::RateLimited));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn sends_trimmed_transcript_and_token_ceiling() {
        let provider = ScriptedProvider::replying(&full_reply().to_string());
        let expander =
            Expander::new(provider.clone(), SectionCatalog::default()).with_max_tokens(1024);

        expander.expand("  solar lanterns  ").await.unwrap();

        let prompts = provider.prompts.lock().unwrap();
        let (prompt, max_tokens) = &prompts[0];
        assert!(prompt.contains("Idea Transcript: \"solar lanterns\""));
        assert_eq!(*max_tokens, 1024);
    }

    #[test]
    fn empty_object_degrades_every_field() {
        let result = map_response(&Map::new(), &SectionCatalog::default());

        assert_eq!(result.title, MISSING_TITLE);
        assert_eq!(result.expansions.len(), 6);
        assert!(result
            .expansions
            .iter()
            .all(|e| e.content == MISSING_SECTION_CONTENT));
    }

    #[test]
    fn blank_and_non_string_fields_get_placeholders() {
        let reply = json!({
            "title": "   ",
            "sections": {
                "problemPainPoint": "",
                "targetCustomer": ["not", "a", "string"],
                "marketSize": 42
            }
        });

        let result = map_response(reply.as_object().unwrap(), &SectionCatalog::default());
        assert_eq!(result.title, MISSING_TITLE);
        assert!(result.expansions[..3]
            .iter()
            .all(|e| e.content == MISSING_SECTION_CONTENT));
    }

    #[test]
    fn extra_sections_are_ignored() {
        let catalog = SectionCatalog::new(vec![SectionSpec::new(
            "risks",
            "Risks & Challenges",
            "What could go wrong?",
        )])
        .unwrap();
        let reply = json!({
            "title": "Lanterns",
            "sections": {"risks": "Supply chain.", "marketSize": "Huge."}
        });

        let result = map_response(reply.as_object().unwrap(), &catalog);
        assert_eq!(
            result.expansions,
            vec![Expansion {
                section_title: "Risks & Challenges".to_string(),
                content: "Supply chain.".to_string(),
            }]
        );
    }
}
