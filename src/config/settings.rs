//! Application settings management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::expansion::{
    default_sections, SectionCatalog, SectionSpec, DEFAULT_MAX_TOKENS, MAX_TRANSCRIPT_CHARS,
};

const REDACTED: &str = "********";

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// General settings
    #[serde(default)]
    pub general: GeneralSettings,

    /// LLM provider settings
    #[serde(default)]
    pub llm: LlmSettings,

    /// Transcript limits and the section catalog
    #[serde(default)]
    pub expansion: ExpansionSettings,

    /// Callable HTTP server settings
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Data directory for the idea library
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// LLM provider (anthropic, gemini)
    #[serde(default = "default_llm_provider")]
    pub provider: String,

    /// API key (prefer IDEASPOT_API_KEY over storing it here)
    #[serde(default)]
    pub api_key: String,

    /// Model name (empty = provider default)
    #[serde(default)]
    pub model: String,

    /// API endpoint override (empty = provider default)
    #[serde(default)]
    pub endpoint: String,

    /// Output-token ceiling per expansion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpansionSettings {
    /// Longest accepted transcript, in characters
    #[serde(default = "default_max_transcript_chars")]
    pub max_transcript_chars: usize,

    /// Ordered section catalog
    #[serde(default = "default_sections")]
    pub sections: Vec<SectionSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Address the callable endpoint listens on
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Maximum concurrent expansions; further calls are rejected
    #[serde(default = "default_max_instances")]
    pub max_instances: usize,

    /// Reject calls that carry no bearer token
    #[serde(default = "default_true")]
    pub require_auth: bool,

    /// Deadline for one expansion call in seconds (0 = none)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

// Default value functions

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("com", "ideaspot", "ideaspot")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.local/share/ideaspot"))
}

fn default_llm_provider() -> String {
    "anthropic".to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_max_transcript_chars() -> usize {
    MAX_TRANSCRIPT_CHARS
}

fn default_bind() -> String {
    "127.0.0.1:8787".to_string()
}

fn default_max_instances() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            api_key: String::new(),
            model: String::new(),
            endpoint: String::new(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSettings")
            .field("provider", &self.provider)
            .field("api_key", &if self.api_key.is_empty() { "" } else { REDACTED })
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for ExpansionSettings {
    fn default() -> Self {
        Self {
            max_transcript_chars: default_max_transcript_chars(),
            sections: default_sections(),
        }
    }
}

impl ExpansionSettings {
    /// Validated section catalog.
    pub fn catalog(&self) -> Result<SectionCatalog> {
        SectionCatalog::new(self.sections.clone())
            .context("Invalid [[expansion.sections]] config")
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_instances: default_max_instances(),
            require_auth: true,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ServerSettings {
    /// Validated concurrency ceiling: at least 1, at most what a semaphore can hold.
    pub fn permit_count(&self) -> Result<usize> {
        let max = tokio::sync::Semaphore::MAX_PERMITS;
        if self.max_instances == 0 || self.max_instances > max {
            anyhow::bail!(
                "server.max_instances must be between 1 and {}, got {}",
                max,
                self.max_instances
            );
        }
        Ok(self.max_instances)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            general: GeneralSettings::default(),
            llm: LlmSettings::default(),
            expansion: ExpansionSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from the configuration file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::info!("No config file found, using defaults");
            let mut settings = Self::default();
            settings.apply_env_overrides();
            return Ok(settings);
        }

        Self::load_from(&config_path)
    }

    /// Load settings from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        settings.apply_env_overrides();

        Ok(settings)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if !self.llm.api_key.trim().is_empty() {
            return;
        }

        let provider_var = match self.llm.provider.to_lowercase().as_str() {
            "gemini" => "GEMINI_API_KEY",
            _ => "ANTHROPIC_API_KEY",
        };

        for var in ["IDEASPOT_API_KEY", provider_var] {
            if let Ok(key) = std::env::var(var) {
                if !key.trim().is_empty() {
                    self.llm.api_key = key;
                    return;
                }
            }
        }
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "ideaspot", "ideaspot")
            .context("Could not determine config directory")?;

        let config_dir = dirs.config_dir();
        Ok(config_dir.join("config.toml"))
    }

    /// Write default configuration to a file
    pub fn write_default(path: &Path) -> Result<()> {
        let settings = Self::default();
        let content = toml::to_string_pretty(&settings)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Copy of these settings safe to print: the API key is masked.
    pub fn redacted(&self) -> Self {
        let mut settings = self.clone();
        if !settings.llm.api_key.is_empty() {
            settings.llm.api_key = REDACTED.to_string();
        }
        settings
    }

    /// Get the database path
    pub fn database_path(&self) -> PathBuf {
        self.general.data_dir.join("ideaspot.db")
    }
}
