//! `expandIdea` callable endpoint

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::AUTHORIZATION, HeaderMap},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::config::ServerSettings;
use crate::expansion::Expander;
use crate::server::error::{error_mapper, CallableError, CallableStatus};

#[derive(Clone)]
pub struct CallableState {
    pub expander: Arc<Expander>,
    pub permits: Arc<Semaphore>,
    pub require_auth: bool,
    pub request_timeout: Option<Duration>,
}

impl CallableState {
    pub fn new(expander: Arc<Expander>, settings: &ServerSettings) -> anyhow::Result<Self> {
        let permits = settings
            .permit_count()
            .context("Invalid [server] config")?;

        Ok(Self {
            expander,
            permits: Arc::new(Semaphore::new(permits)),
            require_auth: settings.require_auth,
            request_timeout: settings.request_timeout(),
        })
    }
}

pub fn build_router(state: CallableState) -> Router {
    Router::new()
        .route("/expandIdea", post(expand_idea))
        .route("/healthz", get(health))
        .with_state(state)
}

/// Callable request envelope: `{"data": {...}}`
#[derive(Debug, Deserialize)]
pub struct CallableRequest {
    #[serde(default)]
    data: Value,
}

async fn health() -> &'static str {
    "ok"
}

async fn expand_idea(
    State(state): State<CallableState>,
    headers: HeaderMap,
    body: Result<Json<CallableRequest>, JsonRejection>,
) -> Result<Json<Value>, CallableError> {
    if state.require_auth && bearer_token(&headers).is_none() {
        warn!("expandIdea called without credentials");
        return Err(CallableError::new(
            CallableStatus::Unauthenticated,
            "User must be authenticated to expand ideas",
        ));
    }

    let Json(request) = body.map_err(|rejection| {
        warn!(error = %rejection, "Rejected expandIdea body");
        CallableError::invalid_argument("Request body must be a JSON object with a data field")
    })?;

    let transcript = request
        .data
        .get("transcript")
        .and_then(Value::as_str)
        .ok_or_else(|| CallableError::invalid_argument("Invalid transcript provided"))?;

    let _permit = state.permits.clone().try_acquire_owned().map_err(|_| {
        warn!("Concurrency ceiling reached, rejecting expandIdea call");
        CallableError::new(
            CallableStatus::ResourceExhausted,
            "Too many requests. Please try again later.",
        )
    })?;

    info!(
        transcript_chars = transcript.chars().count(),
        "Received expandIdea call"
    );

    let expansion = state.expander.expand(transcript);
    let outcome = match state.request_timeout {
        Some(deadline) => tokio::time::timeout(deadline, expansion)
            .await
            .map_err(|_| {
                error!(deadline_secs = deadline.as_secs(), "expandIdea deadline exceeded");
                CallableError::new(
                    CallableStatus::DeadlineExceeded,
                    "Idea expansion took too long. Please try again.",
                )
            })?,
        None => expansion.await,
    };

    match outcome {
        Ok(result) => Ok(Json(json!({ "result": result }))),
        Err(e) => {
            error!(error = %e, "expandIdea failed");
            Err(error_mapper(&e))
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
