mod credential;
mod image;
mod llm;
mod observability;
mod search;
mod storage;

pub use credential::*;
pub use image::*;
pub use llm::*;
pub use observability::*;
pub use search::*;
pub use storage::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Chat platform
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Credentials of the chat platform the command layer connects to.
/// Only checked for presence here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(default = "d_platform_token")]
    pub token: CredentialConfig,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            token: d_platform_token(),
        }
    }
}

fn d_platform_token() -> CredentialConfig {
    CredentialConfig::from_env("DISCORD_BOT_TOKEN")
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the structural parts of the configuration.
    ///
    /// Credentials are not resolved here; `doctor` reports those.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.llm.base_url.trim().is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "llm.base_url".into(),
                message: "base_url must not be empty".into(),
            });
        }

        for (field, model) in [
            ("llm.text_model", &self.llm.text_model),
            ("llm.vision_model", &self.llm.vision_model),
            ("image.model", &self.image.model),
        ] {
            if model.trim().is_empty() {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: field.into(),
                    message: "model name must not be empty".into(),
                });
            }
        }

        if self.image.max_attempts == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "image.max_attempts".into(),
                message: "at least one attempt is required".into(),
            });
        }

        if self.search.num_results == 0 || self.search.num_results > 10 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "search.num_results".into(),
                message: "the search API accepts between 1 and 10 results".into(),
            });
        }

        if self.storage.shared_file.as_os_str().is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "storage.shared_file".into(),
                message: "shared history file name must not be empty".into(),
            });
        }

        errors
    }
}
