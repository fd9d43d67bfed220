//! Expansion module for ideaspot
//!
//! Turns a raw idea transcript into a title and an ordered set of sections:
//! validate the transcript, prompt the model once, clean up and parse its
//! JSON reply, then map it onto the section catalog.

mod catalog;
mod preprocess;
mod prompts;
mod sanitize;
mod transformer;
mod types;

pub use catalog::{default_sections, SectionCatalog, SectionSpec};
pub use preprocess::{preprocess_transcript, MAX_TRANSCRIPT_CHARS};
pub use prompts::build_expansion_prompt;
pub use sanitize::strip_code_fence;
pub use transformer::{map_response, Expander, DEFAULT_MAX_TOKENS};
pub use types::{
    Expansion, ExpansionRequest, ExpansionResult, MISSING_SECTION_CONTENT, MISSING_TITLE,
};
