//! Google Gemini adapter.
//!
//! Implements the Gemini `generateContent` API for multi-turn text and
//! single-turn image understanding. Auth is via an API key passed as a
//! query parameter (`key={api_key}`).

use std::time::{Duration, Instant};

use base64::Engine as _;
use serde_json::Value;

use gr_domain::config::{GenerationParams, LlmConfig, SafetyConfig};
use gr_domain::error::{Error, Result};
use gr_domain::trace::TraceEvent;
use gr_domain::ConversationEntry;

use crate::traits::{TextCompletion, VisionCompletion, VisionRequest};
use crate::util::{from_reqwest, optional_credential, redact_url_key, transport_error};

const PROVIDER: &str = "gemini";

/// Finish reasons that mean the candidate was withheld for policy reasons.
const BLOCKING_FINISH_REASONS: &[&str] = &["SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII"];

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Parsed reply
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A `generateContent` response reduced to what callers act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeminiReply {
    Text(String),
    Blocked { reason: String },
    Malformed { detail: String },
}

impl GeminiReply {
    fn into_result(self) -> Result<String> {
        match self {
            GeminiReply::Text(t) => Ok(t),
            GeminiReply::Blocked { reason } => Err(Error::ContentBlocked {
                provider: PROVIDER.into(),
                reason,
            }),
            GeminiReply::Malformed { detail } => Err(Error::MalformedResponse {
                provider: PROVIDER.into(),
                detail,
            }),
        }
    }

    fn outcome(&self) -> &'static str {
        match self {
            GeminiReply::Text(_) => "ok",
            GeminiReply::Blocked { .. } => "blocked",
            GeminiReply::Malformed { .. } => "malformed",
        }
    }
}

/// Reduce a response body to a [`GeminiReply`].
///
/// The first candidate's non-thought text parts are concatenated. A prompt
/// block reason wins over everything else.
pub fn parse_generate_response(body: &Value) -> GeminiReply {
    if let Some(reason) = body
        .pointer("/promptFeedback/blockReason")
        .and_then(|r| r.as_str())
    {
        return GeminiReply::Blocked {
            reason: reason.to_owned(),
        };
    }

    let Some(candidate) = body
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
    else {
        return GeminiReply::Malformed {
            detail: "no candidates in response".into(),
        };
    };

    let finish = candidate.get("finishReason").and_then(|f| f.as_str());

    let text: String = candidate
        .pointer("/content/parts")
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter(|p| !p.get("thought").and_then(|t| t.as_bool()).unwrap_or(false))
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect()
        })
        .unwrap_or_default();

    if let Some(reason) = finish.filter(|f| BLOCKING_FINISH_REASONS.contains(f)) {
        if text.is_empty() {
            return GeminiReply::Blocked {
                reason: reason.to_owned(),
            };
        }
    }

    if text.is_empty() {
        return GeminiReply::Malformed {
            detail: format!(
                "candidate has no text (finishReason: {})",
                finish.unwrap_or("none")
            ),
        };
    }

    GeminiReply::Text(text)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct GeminiClient {
    base_url: String,
    api_key: Option<String>,
    text_model: String,
    vision_model: String,
    text_params: GenerationParams,
    vision_params: GenerationParams,
    safety: SafetyConfig,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn from_config(cfg: &LlmConfig) -> Result<Self> {
        let api_key = optional_credential(&cfg.auth, "gemini api key");
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key,
            text_model: cfg.text_model.clone(),
            vision_model: cfg.vision_model.clone(),
            text_params: cfg.text,
            vision_params: cfg.vision,
            safety: cfg.safety.clone(),
            client,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    // ── Internal helpers ───────────────────────────────────────────

    fn generate_url(&self, model: &str, api_key: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, api_key
        )
    }

    fn build_body(&self, contents: Vec<Value>, params: &GenerationParams) -> Value {
        let safety: Vec<Value> = self
            .safety
            .categories
            .iter()
            .map(|c| serde_json::json!({"category": c, "threshold": self.safety.threshold}))
            .collect();

        serde_json::json!({
            "contents": contents,
            "generationConfig": {
                "temperature": params.temperature,
                "topK": params.top_k,
                "topP": params.top_p,
                "maxOutputTokens": params.max_output_tokens,
            },
            "safetySettings": safety,
        })
    }

    async fn generate(&self, model: &str, body: Value, turns: usize) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(Error::NotConfigured("gemini api key".into()));
        };
        let url = self.generate_url(model, api_key);

        tracing::debug!(provider = PROVIDER, model, url = %redact_url_key(&url), "gemini request");

        let start = Instant::now();
        let resp = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        let resp_text = resp.text().await.map_err(from_reqwest)?;
        let duration_ms = start.elapsed().as_millis() as u64;

        if !status.is_success() {
            TraceEvent::LlmRequest {
                provider: PROVIDER.into(),
                model: model.into(),
                turns,
                duration_ms,
                outcome: format!("http_{}", status.as_u16()),
            }
            .emit();
            return Err(transport_error(PROVIDER, status.as_u16(), &resp_text));
        }

        let reply = match serde_json::from_str::<Value>(&resp_text) {
            Ok(json) => parse_generate_response(&json),
            Err(e) => GeminiReply::Malformed {
                detail: format!("body is not JSON: {e}"),
            },
        };

        TraceEvent::LlmRequest {
            provider: PROVIDER.into(),
            model: model.into(),
            turns,
            duration_ms,
            outcome: reply.outcome().into(),
        }
        .emit();

        reply.into_result()
    }
}

fn entry_to_gemini(entry: &ConversationEntry) -> Value {
    serde_json::json!({
        "role": entry.role().as_str(),
        "parts": [{"text": entry.text()}],
    })
}

#[async_trait::async_trait]
impl TextCompletion for GeminiClient {
    async fn complete(&self, transcript: &[ConversationEntry]) -> Result<String> {
        let contents: Vec<Value> = transcript.iter().map(entry_to_gemini).collect();
        let body = self.build_body(contents, &self.text_params);
        self.generate(&self.text_model, body, transcript.len()).await
    }
}

#[async_trait::async_trait]
impl VisionCompletion for GeminiClient {
    async fn describe(&self, req: VisionRequest) -> Result<String> {
        let data = base64::engine::general_purpose::STANDARD.encode(&req.image);
        let contents = vec![serde_json::json!({
            "role": "user",
            "parts": [
                {"text": req.prompt},
                {"inlineData": {"mimeType": req.mime_type, "data": data}},
            ],
        })];
        let body = self.build_body(contents, &self.vision_params);
        self.generate(&self.vision_model, body, 1).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn concatenates_text_parts_and_skips_thoughts() {
        let body = json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "thinking...", "thought": true},
                    {"text": "hi "},
                    {"text": "there"}
                ]},
                "finishReason": "STOP"
            }]
        });
        assert_eq!(parse_generate_response(&body), GeminiReply::Text("hi there".into()));
    }

    #[test]
    fn prompt_feedback_block() {
        let body = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        assert_eq!(
            parse_generate_response(&body),
            GeminiReply::Blocked { reason: "SAFETY".into() }
        );
    }

    #[test]
    fn safety_finish_without_text_is_blocked() {
        let body = json!({"candidates": [{"finishReason": "SAFETY", "safetyRatings": []}]});
        assert_eq!(
            parse_generate_response(&body),
            GeminiReply::Blocked { reason: "SAFETY".into() }
        );
    }

    #[test]
    fn missing_candidates_is_malformed() {
        assert!(matches!(
            parse_generate_response(&json!({})),
            GeminiReply::Malformed { .. }
        ));
        assert!(matches!(
            parse_generate_response(&json!({"candidates": [{"finishReason": "MAX_TOKENS"}]})),
            GeminiReply::Malformed { .. }
        ));
    }

    #[test]
    fn body_carries_params_and_safety() {
        let client = GeminiClient::from_config(&LlmConfig::default()).unwrap();
        let body = client.build_body(
            vec![entry_to_gemini(&ConversationEntry::user("hello"))],
            &GenerationParams::text(),
        );
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["topK"], 1);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
        assert_eq!(body["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(body["safetySettings"][0]["threshold"], "BLOCK_MEDIUM_AND_ABOVE");
    }

    #[tokio::test]
    async fn missing_key_fails_fast() {
        let mut cfg = LlmConfig::default();
        cfg.auth = gr_domain::config::CredentialConfig::from_env("GR_TEST_NO_SUCH_GEMINI_KEY");
        let client = GeminiClient::from_config(&cfg).unwrap();
        assert!(!client.is_configured());
        let err = client
            .complete(&[ConversationEntry::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotConfigured(_)));
    }
}
