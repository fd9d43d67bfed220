//! Section catalog: the ordered list of sections an idea is expanded into

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{IdeaSpotError, Result};

/// One named slot of generated content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSpec {
    /// Stable key the model uses in its JSON reply
    pub key: String,

    /// Human-readable title shown with the content
    pub title: String,

    /// What the model should write for this section
    pub instruction: String,
}

impl SectionSpec {
    pub fn new(key: &str, title: &str, instruction: &str) -> Self {
        Self {
            key: key.to_string(),
            title: title.to_string(),
            instruction: instruction.to_string(),
        }
    }
}

/// Validated, ordered set of section specs.
///
/// Order is significant: it is the order of `ExpansionResult::expansions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionCatalog {
    sections: Vec<SectionSpec>,
}

impl SectionCatalog {
    /// Build a catalog, rejecting empty catalogs, blank keys/titles and duplicate keys.
    pub fn new(sections: Vec<SectionSpec>) -> Result<Self> {
        if sections.is_empty() {
            return Err(IdeaSpotError::Config(
                "section catalog must contain at least one section".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for section in &sections {
            if section.key.trim().is_empty() {
                return Err(IdeaSpotError::Config(
                    "section key must not be empty".to_string(),
                ));
            }
            if section.title.trim().is_empty() {
                return Err(IdeaSpotError::Config(format!(
                    "section '{}' has an empty title",
                    section.key
                )));
            }
            if !seen.insert(section.key.as_str()) {
                return Err(IdeaSpotError::Config(format!(
                    "duplicate section key '{}'",
                    section.key
                )));
            }
        }

        Ok(Self { sections })
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SectionSpec> {
        self.sections.iter()
    }

    pub fn as_slice(&self) -> &[SectionSpec] {
        &self.sections
    }
}

impl Default for SectionCatalog {
    fn default() -> Self {
        Self {
            sections: default_sections(),
        }
    }
}

/// The built-in business-idea catalog.
pub fn default_sections() -> Vec<SectionSpec> {
    vec![
        SectionSpec::new(
            "problemPainPoint",
            "Problem/Pain Point",
            "What specific problem does this solve? Be concrete and identify the core issue.",
        ),
        SectionSpec::new(
            "targetCustomer",
            "Target Customer",
            "Who is the target customer? Describe their demographics, behaviors, and needs.",
        ),
        SectionSpec::new(
            "marketSize",
            "Market Size/Opportunity",
            "What is the market size? Provide estimates and market context.",
        ),
        SectionSpec::new(
            "validationPlan",
            "Validation Plan",
            "How can this be validated? Suggest concrete steps to test demand.",
        ),
        SectionSpec::new(
            "firstSteps",
            "First Steps",
            "What are the first steps to get started? Provide actionable steps.",
        ),
        SectionSpec::new(
            "nameOptions",
            "Name Options",
            "Generate 5 potential names for this idea. Make them memorable, professional, \
             and creative. Format as a bulleted list.",
        ),
    ]
}
