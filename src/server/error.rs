//! Callable error envelope

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{IdeaSpotError, UpstreamKind};

/// Status codes of the callable protocol that this endpoint emits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallableStatus {
    InvalidArgument,
    Unauthenticated,
    ResourceExhausted,
    DeadlineExceeded,
    Internal,
}

impl CallableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::ResourceExhausted => "RESOURCE_EXHAUSTED",
            Self::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Self::Internal => "INTERNAL",
        }
    }

    fn http_status(&self) -> StatusCode {
        match self {
            Self::InvalidArgument => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::ResourceExhausted => StatusCode::TOO_MANY_REQUESTS,
            Self::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug)]
pub struct CallableError {
    pub status: CallableStatus,
    pub message: String,
}

impl CallableError {
    pub fn new(status: CallableStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(CallableStatus::InvalidArgument, message)
    }
}

impl IntoResponse for CallableError {
    fn into_response(self) -> Response {
        (
            self.status.http_status(),
            Json(json!({
                "error": {
                    "status": self.status.as_str(),
                    "message": self.message,
                }
            })),
        )
            .into_response()
    }
}

/// Map an expansion failure to what the caller is allowed to see.
///
/// Only invalid-argument messages are passed through; upstream details stay in the logs.
pub fn error_mapper(error: &IdeaSpotError) -> CallableError {
    match error {
        IdeaSpotError::InvalidArgument(message) => CallableError::invalid_argument(message.clone()),
        IdeaSpotError::UpstreamFailure {
            kind: UpstreamKind::RateLimited,
            ..
        } => CallableError::new(
            CallableStatus::ResourceExhausted,
            "Too many requests. Please try again later.",
        ),
        IdeaSpotError::MalformedResponse(_) => {
            CallableError::new(CallableStatus::Internal, "Failed to parse AI response")
        }
        _ => CallableError::new(
            CallableStatus::Internal,
            "Failed to expand idea. Please try again.",
        ),
    }
}
