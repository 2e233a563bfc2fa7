use serde::{Deserialize, Serialize};

use super::CredentialConfig;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Web search (Custom Search JSON API)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "d_search_url")]
    pub base_url: String,
    #[serde(default = "d_search_auth")]
    pub auth: CredentialConfig,
    /// Programmable search engine id (`cx`).
    #[serde(default = "d_engine_id")]
    pub engine_id: CredentialConfig,
    #[serde(default = "d_3")]
    pub num_results: u32,
    #[serde(default = "d_20000")]
    pub timeout_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: d_search_url(),
            auth: d_search_auth(),
            engine_id: d_engine_id(),
            num_results: 3,
            timeout_ms: 20_000,
        }
    }
}

fn d_search_url() -> String {
    "https://www.googleapis.com".into()
}
fn d_search_auth() -> CredentialConfig {
    CredentialConfig::from_env("GOOGLE_API_KEY")
}
fn d_engine_id() -> CredentialConfig {
    CredentialConfig::from_env("GOOGLE_CSE_ID")
}
fn d_3() -> u32 {
    3
}
fn d_20000() -> u64 {
    20_000
}
