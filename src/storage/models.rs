//! Data models for storage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::expansion::ExpansionResult;

/// Processing status of an idea
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdeaStatus {
    /// Waiting for the expansion to come back
    Processing,
    /// Expanded successfully
    Complete,
    /// Expansion failed; only the transcript is kept
    Failed,
}

impl IdeaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "processing" => Some(Self::Processing),
            "complete" => Some(Self::Complete),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// A captured idea and its expansion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    /// Unique identifier (UUID)
    pub id: String,

    /// Transcript the idea was expanded from
    pub transcript: String,

    /// Model-generated (or user-edited) title
    pub title: Option<String>,

    /// Current status
    pub status: IdeaStatus,

    /// Expansion sections, in display order
    pub sections: Vec<IdeaSection>,

    /// Marked as favorite
    pub is_favorite: bool,

    /// Tags for categorization
    pub tags: Vec<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Idea {
    /// Create a new idea for a transcript that has not been expanded yet
    pub fn new(transcript: String) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            transcript,
            title: None,
            status: IdeaStatus::Processing,
            sections: Vec::new(),
            is_favorite: false,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a completed idea from an expansion result
    pub fn from_expansion(transcript: String, result: ExpansionResult) -> Self {
        let mut idea = Self::new(transcript);
        idea.title = Some(result.title);
        idea.status = IdeaStatus::Complete;
        idea.sections = result
            .expansions
            .into_iter()
            .enumerate()
            .map(|(position, e)| IdeaSection::new(position, e.section_title, e.content))
            .collect();
        idea
    }

    /// Title for display, falling back to the start of the transcript
    pub fn display_title(&self) -> String {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => title.to_string(),
            _ => {
                let preview: String = self.transcript.chars().take(40).collect();
                if self.transcript.chars().count() > 40 {
                    format!("{}...", preview)
                } else {
                    preview
                }
            }
        }
    }

    /// Add a tag if not already present. Returns whether it was added.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    /// Remove a tag (case-insensitive). Returns whether it was present.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| !t.eq_ignore_ascii_case(tag.trim()));
        self.tags.len() != before
    }
}

/// One stored expansion section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaSection {
    /// Database row id
    pub id: i64,

    /// Zero-based display position
    pub position: usize,

    pub section_title: String,

    pub content: String,
}

impl IdeaSection {
    pub fn new(position: usize, section_title: String, content: String) -> Self {
        Self {
            id: 0, // Will be set by database
            position,
            section_title,
            content,
        }
    }
}
