use serde::{Deserialize, Serialize};

use super::CredentialConfig;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Generation provider (Gemini)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "d_llm_url")]
    pub base_url: String,
    #[serde(default = "d_model")]
    pub text_model: String,
    #[serde(default = "d_model")]
    pub vision_model: String,
    #[serde(default = "d_120000")]
    pub timeout_ms: u64,
    #[serde(default = "d_llm_auth")]
    pub auth: CredentialConfig,
    #[serde(default = "GenerationParams::text")]
    pub text: GenerationParams,
    #[serde(default = "GenerationParams::vision")]
    pub vision: GenerationParams,
    #[serde(default)]
    pub safety: SafetyConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: d_llm_url(),
            text_model: d_model(),
            vision_model: d_model(),
            timeout_ms: 120_000,
            auth: d_llm_auth(),
            text: GenerationParams::text(),
            vision: GenerationParams::vision(),
            safety: SafetyConfig::default(),
        }
    }
}

/// Sampling parameters sent as `generationConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl GenerationParams {
    /// Defaults for multi-turn text chat.
    pub fn text() -> Self {
        Self {
            temperature: 0.7,
            top_k: 1,
            top_p: 1.0,
            max_output_tokens: 8192,
        }
    }

    /// Defaults for single-turn image analysis.
    pub fn vision() -> Self {
        Self {
            temperature: 0.4,
            top_k: 32,
            top_p: 1.0,
            max_output_tokens: 4096,
        }
    }
}

/// Content-safety thresholds sent as `safetySettings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyConfig {
    #[serde(default = "d_threshold")]
    pub threshold: String,
    #[serde(default = "d_categories")]
    pub categories: Vec<String>,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            threshold: d_threshold(),
            categories: d_categories(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_llm_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn d_model() -> String {
    "gemini-2.5-pro-preview-05-06".into()
}
fn d_120000() -> u64 {
    120_000
}
fn d_llm_auth() -> CredentialConfig {
    CredentialConfig::from_env("GEMINI_API_KEY")
}
fn d_threshold() -> String {
    "BLOCK_MEDIUM_AND_ABOVE".into()
}
fn d_categories() -> Vec<String> {
    [
        "HARM_CATEGORY_HARASSMENT",
        "HARM_CATEGORY_HATE_SPEECH",
        "HARM_CATEGORY_SEXUALLY_EXPLICIT",
        "HARM_CATEGORY_DANGEROUS_CONTENT",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
