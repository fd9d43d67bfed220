//! Configuration module for ideaspot
//!
//! Handles loading and managing application settings from TOML files.

mod settings;

pub use settings::{ExpansionSettings, GeneralSettings, LlmSettings, ServerSettings, Settings};
