use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{serve, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use ideaspot::config::Settings;
use ideaspot::expansion::{Expander, MISSING_SECTION_CONTENT};
use ideaspot::{IdeaSpotError, UpstreamKind};

const TRANSCRIPT: &str = "An app that connects dog owners with neighbors who can walk their dogs during the day";

#[derive(Clone)]
struct FakeProvider {
    status: StatusCode,
    body: Value,
    seen: Arc<Mutex<Vec<(HeaderMap, Value)>>>,
}

async fn fake_messages(
    State(fake): State<FakeProvider>,
    headers: HeaderMap,
    Json(request): Json<Value>,
) -> (StatusCode, Json<Value>) {
    fake.seen
        .lock()
        .expect("request log")
        .push((headers, request));
    (fake.status, Json(fake.body.clone()))
}

/// Serve a canned Messages API reply and return the endpoint plus the request log.
async fn spawn_fake_anthropic(
    status: StatusCode,
    body: Value,
) -> (String, Arc<Mutex<Vec<(HeaderMap, Value)>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/v1/messages", post(fake_messages))
        .with_state(FakeProvider {
            status,
            body,
            seen: seen.clone(),
        });

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        serve(listener, app).await.expect("fake provider run");
    });

    (format!("http://{}", addr), seen)
}

fn text_reply(text: &str) -> Value {
    json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "model": "claude-test",
        "content": [{ "type": "text", "text": text }],
        "stop_reason": "end_turn",
        "usage": { "input_tokens": 420, "output_tokens": 880 }
    })
}

fn full_model_json() -> String {
    json!({
        "title": "WalkMate",
        "sections": {
            "problemPainPoint": "Owners work long hours and dogs need midday walks.",
            "targetCustomer": "Urban professionals aged 25-45 with dogs.",
            "marketSize": "The US pet care market is over $100B.",
            "validationPlan": "Survey 50 owners at dog parks.",
            "firstSteps": "Recruit ten walkers in one neighborhood.",
            "nameOptions": "• WalkMate\n• PawPal\n• NeighborWalk"
        }
    })
    .to_string()
}

fn settings_for(endpoint: &str) -> Settings {
    let mut settings = Settings::default();
    settings.llm.api_key = "sk-ant-test".to_string();
    settings.llm.endpoint = endpoint.to_string();
    settings
}

#[tokio::test]
async fn expansion_maps_all_sections_in_catalog_order() {
    let (endpoint, seen) =
        spawn_fake_anthropic(StatusCode::OK, text_reply(&full_model_json())).await;
    let expander = Expander::from_settings(&settings_for(&endpoint)).expect("expander");

    let result = expander
        .expand(&format!("   {}  \n", TRANSCRIPT))
        .await
        .expect("expansion should succeed");

    assert_eq!(result.title, "WalkMate");
    let titles: Vec<&str> = result
        .expansions
        .iter()
        .map(|e| e.section_title.as_str())
        .collect();
    assert_eq!(
        titles,
        [
            "Problem/Pain Point",
            "Target Customer",
            "Market Size/Opportunity",
            "Validation Plan",
            "First Steps",
            "Name Options",
        ]
    );
    assert_eq!(result.expansions[5].content, "• WalkMate\n• PawPal\n• NeighborWalk");

    let seen = seen.lock().expect("request log");
    assert_eq!(seen.len(), 1, "the model is called exactly once");
    let (headers, request) = &seen[0];
    assert_eq!(headers.get("x-api-key").unwrap(), "sk-ant-test");
    assert_eq!(headers.get("anthropic-version").unwrap(), "2023-06-01");
    assert_eq!(request["max_tokens"], 4096);
    let prompt = request["messages"][0]["content"].as_str().unwrap();
    assert!(prompt.contains(&format!("\"{}\"", TRANSCRIPT)));
    assert!(prompt.contains("Problem/Pain Point (problemPainPoint)"));
}

#[tokio::test]
async fn fenced_reply_with_missing_section_degrades_to_placeholder() {
    let reply = "```json\n{\"title\": \"PlantPal\", \"sections\": {\"problemPainPoint\": \"Plants die.\"}}\n```";
    let (endpoint, _seen) = spawn_fake_anthropic(StatusCode::OK, text_reply(reply)).await;
    let expander = Expander::from_settings(&settings_for(&endpoint)).expect("expander");

    let result = expander.expand(TRANSCRIPT).await.expect("expansion");

    assert_eq!(result.title, "PlantPal");
    assert_eq!(result.expansions.len(), 6);
    assert_eq!(result.expansions[0].content, "Plants die.");
    assert!(result.expansions[1..]
        .iter()
        .all(|e| e.content == MISSING_SECTION_CONTENT));
}

#[tokio::test]
async fn prose_reply_is_malformed_response() {
    let (endpoint, _seen) = spawn_fake_anthropic(
        StatusCode::OK,
        text_reply("Sure! Here is my analysis of your idea."),
    )
    .await;
    let expander = Expander::from_settings(&settings_for(&endpoint)).expect("expander");

    let err = expander.expand(TRANSCRIPT).await.unwrap_err();
    assert!(matches!(err, IdeaSpotError::MalformedResponse(_)), "{err}");
}

#[tokio::test]
async fn rate_limited_provider_is_classified() {
    let (endpoint, _seen) = spawn_fake_anthropic(
        StatusCode::TOO_MANY_REQUESTS,
        json!({
            "type": "error",
            "error": { "type": "rate_limit_error", "message": "Rate limit exceeded" }
        }),
    )
    .await;
    let expander = Expander::from_settings(&settings_for(&endpoint)).expect("expander");

    let err = expander.expand(TRANSCRIPT).await.unwrap_err();
    assert_eq!(err.upstream_kind(), Some(UpstreamKind::RateLimited));
    assert!(err.to_string().contains("Rate limit exceeded"));
}

#[tokio::test]
async fn rejected_key_is_authentication_failure_without_leaking_key() {
    let (endpoint, _seen) = spawn_fake_anthropic(
        StatusCode::UNAUTHORIZED,
        json!({
            "type": "error",
            "error": { "type": "authentication_error", "message": "invalid x-api-key" }
        }),
    )
    .await;
    let expander = Expander::from_settings(&settings_for(&endpoint)).expect("expander");

    let err = expander.expand(TRANSCRIPT).await.unwrap_err();
    assert_eq!(err.upstream_kind(), Some(UpstreamKind::Authentication));
    assert!(!err.to_string().contains("sk-ant-test"));
}

#[tokio::test]
async fn invalid_transcript_never_reaches_provider() {
    let (endpoint, seen) =
        spawn_fake_anthropic(StatusCode::OK, text_reply(&full_model_json())).await;
    let expander = Expander::from_settings(&settings_for(&endpoint)).expect("expander");

    let err = expander.expand(" \n\t ").await.unwrap_err();
    assert!(matches!(err, IdeaSpotError::InvalidArgument(_)));

    let err = expander.expand(&"x".repeat(5001)).await.unwrap_err();
    assert!(matches!(err, IdeaSpotError::InvalidArgument(_)));

    assert!(seen.lock().expect("request log").is_empty());
}

#[tokio::test]
async fn gemini_provider_sends_key_in_header() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let reply = json!({
        "candidates": [{ "content": { "parts": [{ "text": full_model_json() }] } }],
        "usageMetadata": { "promptTokenCount": 400, "candidatesTokenCount": 900 },
        "modelVersion": "gemini-test"
    });
    let app = Router::new()
        .route("/models/{call}", post(fake_messages))
        .with_state(FakeProvider {
            status: StatusCode::OK,
            body: reply,
            seen: seen.clone(),
        });
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        serve(listener, app).await.expect("fake provider run");
    });

    let mut settings = settings_for(&format!("http://{}", addr));
    settings.llm.provider = "gemini".to_string();
    settings.llm.api_key = "gemini-secret".to_string();
    let expander = Expander::from_settings(&settings).expect("expander");

    let result = expander.expand(TRANSCRIPT).await.expect("expansion");
    assert_eq!(result.title, "WalkMate");

    let seen = seen.lock().expect("request log");
    let (headers, request) = &seen[0];
    assert_eq!(headers.get("x-goog-api-key").unwrap(), "gemini-secret");
    assert_eq!(request["generationConfig"]["maxOutputTokens"], 4096);
}
