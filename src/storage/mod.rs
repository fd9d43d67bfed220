//! Storage module for ideaspot
//!
//! Keeps expanded ideas in SQLite, with FTS5 for searching section content.

mod database;
mod models;

pub use database::{Database, DatabaseStats};
pub use models::{Idea, IdeaSection, IdeaStatus};
