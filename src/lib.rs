//! ideaspot - Expand spoken ideas into structured notes with an LLM
//!
//! A transcript goes in, a titled set of sections comes out, and the result
//! can be kept in a local idea library.

pub mod cli;
pub mod config;
pub mod expansion;
pub mod llm;
pub mod server;
pub mod storage;

use std::fmt;

use thiserror::Error;

/// Main error type for ideaspot
#[derive(Error, Debug)]
pub enum IdeaSpotError {
    /// Caller supplied input the expansion core refuses to send upstream.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The model API call itself failed.
    #[error("{provider} request failed ({kind}): {message}")]
    UpstreamFailure {
        provider: String,
        kind: UpstreamKind,
        message: String,
    },

    /// The model replied, but not with the JSON shape we asked for.
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl IdeaSpotError {
    /// Upstream failure kind, if this is an upstream failure.
    pub fn upstream_kind(&self) -> Option<UpstreamKind> {
        match self {
            Self::UpstreamFailure { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Why an upstream model call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamKind {
    /// Connection, DNS, TLS or body transfer failure
    Network,
    /// The provider rejected the API key (401/403)
    Authentication,
    /// Provider quota or rate limit (429)
    RateLimited,
    /// Any other non-success HTTP status
    Status(u16),
    /// Success status, but the provider envelope could not be decoded
    Decode,
}

impl fmt::Display for UpstreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Authentication => write!(f, "authentication"),
            Self::RateLimited => write!(f, "rate limited"),
            Self::Status(code) => write!(f, "status {}", code),
            Self::Decode => write!(f, "decode"),
        }
    }
}

pub type Result<T> = std::result::Result<T, IdeaSpotError>;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "ideaspot";
