//! Request and result types of the expansion core

use serde::{Deserialize, Serialize};

use crate::expansion::preprocess::preprocess_transcript;
use crate::Result;

/// Substituted for any section the model left out or left empty.
pub const MISSING_SECTION_CONTENT: &str = "Content not generated";

/// Substituted when the model gave no usable title.
pub const MISSING_TITLE: &str = "Untitled Idea";

/// A validated transcript, ready to be expanded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionRequest {
    transcript: String,
}

impl ExpansionRequest {
    /// Validate and trim a candidate transcript.
    pub fn new(candidate: &str, max_chars: usize) -> Result<Self> {
        let transcript = preprocess_transcript(candidate, max_chars)?;
        Ok(Self {
            transcript: transcript.to_string(),
        })
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }
}

/// Titled, ordered expansion of one idea
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionResult {
    pub title: String,
    pub expansions: Vec<Expansion>,
}

/// One section of an expansion result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expansion {
    pub section_title: String,
    pub content: String,
}
