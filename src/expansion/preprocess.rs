//! Transcript validation before anything is sent upstream

use crate::{IdeaSpotError, Result};

/// Default upper bound on transcript length, in characters.
pub const MAX_TRANSCRIPT_CHARS: usize = 5000;

/// Trim a candidate transcript and check its bounds.
///
/// Length is counted in Unicode scalar values of the trimmed text.
pub fn preprocess_transcript(candidate: &str, max_chars: usize) -> Result<&str> {
    let trimmed = candidate.trim();

    if trimmed.is_empty() {
        return Err(IdeaSpotError::InvalidArgument(
            "Transcript is required and must be a non-empty string".to_string(),
        ));
    }

    if trimmed.chars().count() > max_chars {
        return Err(IdeaSpotError::InvalidArgument(format!(
            "Transcript is too long (max {} characters)",
            max_chars
        )));
    }

    Ok(trimmed)
}
