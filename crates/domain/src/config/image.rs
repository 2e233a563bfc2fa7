use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Image synthesis
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Image synthesis settings. Uses the endpoint and credential of `[llm]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "d_image_model")]
    pub model: String,
    #[serde(default = "d_1")]
    pub sample_count: u32,
    #[serde(default = "d_3")]
    pub max_attempts: u32,
    /// Base of the exponential backoff between attempts.
    #[serde(default = "d_1000")]
    pub base_delay_ms: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            model: d_image_model(),
            sample_count: 1,
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

fn d_image_model() -> String {
    "imagen-3.0-generate-002".into()
}
fn d_1() -> u32 {
    1
}
fn d_3() -> u32 {
    3
}
fn d_1000() -> u64 {
    1000
}
