//! Imagen `predict` adapter.
//!
//! Shares the Gemini endpoint and API key; only the model and payload
//! differ. A single call makes a single attempt. Retrying is left to
//! [`crate::retry::RetryExecutor`].

use std::time::{Duration, Instant};

use base64::Engine as _;
use serde_json::Value;

use gr_domain::config::{ImageConfig, LlmConfig};
use gr_domain::error::{Error, Result};
use gr_domain::trace::TraceEvent;

use crate::traits::ImageSynthesis;
use crate::util::{from_reqwest, optional_credential, redact_url_key, transport_error};

const PROVIDER: &str = "imagen";

/// A `predict` response reduced to what callers act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagenReply {
    Image(Vec<u8>),
    Blocked { reason: String },
    NoImageData { detail: String },
}

/// Reduce a `predict` body to an [`ImagenReply`].
///
/// Checked in order: image bytes, provider error message, block reason.
pub fn parse_predict_response(body: &Value) -> ImagenReply {
    if let Some(encoded) = body
        .pointer("/predictions/0/bytesBase64Encoded")
        .and_then(|b| b.as_str())
        .filter(|b| !b.is_empty())
    {
        return match base64::engine::general_purpose::STANDARD.decode(encoded) {
            Ok(bytes) => ImagenReply::Image(bytes),
            Err(e) => ImagenReply::NoImageData {
                detail: format!("image data is not valid base64: {e}"),
            },
        };
    }

    if let Some(message) = body.pointer("/error/message").and_then(|m| m.as_str()) {
        return ImagenReply::NoImageData {
            detail: message.to_owned(),
        };
    }

    let block = body
        .pointer("/promptFeedback/blockReason")
        .or_else(|| body.pointer("/predictions/0/raiFilteredReason"))
        .and_then(|r| r.as_str());
    if let Some(reason) = block {
        return ImagenReply::Blocked {
            reason: reason.to_owned(),
        };
    }

    ImagenReply::NoImageData {
        detail: "No image data in response.".into(),
    }
}

pub struct ImagenClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    sample_count: u32,
    client: reqwest::Client,
}

impl ImagenClient {
    pub fn from_config(llm: &LlmConfig, image: &ImageConfig) -> Result<Self> {
        let api_key = optional_credential(&llm.auth, "imagen api key");
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(llm.timeout_ms))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            base_url: llm.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: image.model.clone(),
            sample_count: image.sample_count.max(1),
            client,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn predict_url(&self, api_key: &str) -> String {
        format!(
            "{}/v1beta/models/{}:predict?key={}",
            self.base_url, self.model, api_key
        )
    }
}

#[async_trait::async_trait]
impl ImageSynthesis for ImagenClient {
    async fn synthesize(&self, prompt: &str) -> Result<Vec<u8>> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(Error::NotConfigured("imagen api key".into()));
        };
        let url = self.predict_url(api_key);
        let body = serde_json::json!({
            "instances": [{"prompt": prompt}],
            "parameters": {"sampleCount": self.sample_count},
        });

        tracing::debug!(provider = PROVIDER, model = %self.model, url = %redact_url_key(&url), "imagen request");

        let start = Instant::now();
        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;
        let status = resp.status();
        let resp_text = resp.text().await.map_err(from_reqwest)?;
        let duration_ms = start.elapsed().as_millis() as u64;

        let (reply, outcome) = if !status.is_success() {
            (None, format!("http_{}", status.as_u16()))
        } else {
            let reply = match serde_json::from_str::<Value>(&resp_text) {
                Ok(json) => parse_predict_response(&json),
                Err(e) => ImagenReply::NoImageData {
                    detail: format!("body is not JSON: {e}"),
                },
            };
            let outcome = match &reply {
                ImagenReply::Image(_) => "ok",
                ImagenReply::Blocked { .. } => "blocked",
                ImagenReply::NoImageData { .. } => "no_image",
            };
            (Some(reply), outcome.to_owned())
        };

        TraceEvent::LlmRequest {
            provider: PROVIDER.into(),
            model: self.model.clone(),
            turns: 1,
            duration_ms,
            outcome,
        }
        .emit();

        match reply {
            None => Err(transport_error(PROVIDER, status.as_u16(), &resp_text)),
            Some(ImagenReply::Image(bytes)) => Ok(bytes),
            Some(ImagenReply::Blocked { reason }) => Err(Error::ContentBlocked {
                provider: PROVIDER.into(),
                reason,
            }),
            Some(ImagenReply::NoImageData { detail }) => Err(Error::NoImageData(detail)),
        }
    }
}
