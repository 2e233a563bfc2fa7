//! Core runtime: the orchestrator that ties search augmentation, the
//! conversation store, and the backend clients into one request path per
//! command.
//!
//! Provider failures never escape as errors; they are turned into reply
//! text via [`replies`]. Only persistence failures are returned as `Err`.

pub mod augment;
pub mod replies;

use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use gr_domain::error::Result;
use gr_domain::{ConversationEntry, ConversationScope};
use gr_providers::{
    ImageSynthesis, RetryError, RetryExecutor, TextCompletion, VisionCompletion, VisionRequest,
    WebSearch,
};
use gr_sessions::ConversationStore;

use self::augment::{AugmentContext, SearchAugmenter};
use self::replies::Service;

/// Result of an image generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageReply {
    Image(Vec<u8>),
    Failed(String),
}

/// The backend clients the orchestrator calls.
#[derive(Clone)]
pub struct Backends {
    pub text: Arc<dyn TextCompletion>,
    pub vision: Arc<dyn VisionCompletion>,
    pub images: Arc<dyn ImageSynthesis>,
    pub search: Arc<dyn WebSearch>,
}

pub struct Orchestrator {
    store: Arc<ConversationStore>,
    text: Arc<dyn TextCompletion>,
    vision: Arc<dyn VisionCompletion>,
    images: Arc<dyn ImageSynthesis>,
    augmenter: SearchAugmenter,
    image_retry: RetryExecutor,
}

impl Orchestrator {
    pub fn new(
        store: Arc<ConversationStore>,
        backends: Backends,
        search_results: u32,
        image_retry: RetryExecutor,
    ) -> Self {
        Self {
            store,
            text: backends.text,
            vision: backends.vision,
            images: backends.images,
            augmenter: SearchAugmenter::new(backends.search, search_results),
            image_retry,
        }
    }

    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    /// One conversational turn: record the (possibly augmented) prompt,
    /// send the whole transcript, record the answer.
    ///
    /// When the backend fails, the user turn stays in the transcript and
    /// no model turn is added.
    pub async fn handle_text_request(
        &self,
        scope: ConversationScope,
        prompt: &str,
        wants_search: bool,
    ) -> Result<String> {
        let span = tracing::info_span!("text_request", request_id = %Uuid::new_v4(), scope = %scope);
        self.text_turn(scope, prompt, wants_search)
            .instrument(span)
            .await
    }

    async fn text_turn(
        &self,
        scope: ConversationScope,
        prompt: &str,
        wants_search: bool,
    ) -> Result<String> {
        let user_text = if wants_search {
            self.augmenter.augment(prompt, AugmentContext::Text).await
        } else {
            prompt.to_owned()
        };

        self.store
            .append(scope, ConversationEntry::user(user_text))
            .await?;
        let transcript = self.store.get(scope).await?;

        match self.text.complete(transcript.entries()).await {
            Ok(answer) => {
                self.store
                    .append(scope, ConversationEntry::model(answer.clone()))
                    .await?;
                Ok(answer)
            }
            Err(e) => {
                tracing::warn!(error = %e, "text completion failed");
                Ok(replies::failure(Service::Chat, &e))
            }
        }
    }

    /// Describe an image. Never reads or writes a transcript.
    pub async fn handle_vision_request(
        &self,
        image: Vec<u8>,
        mime_type: &str,
        text: Option<&str>,
        wants_search: bool,
    ) -> String {
        let span = tracing::info_span!("vision_request", request_id = %Uuid::new_v4(), mime_type);
        async {
            if !mime_type.starts_with("image/") {
                return replies::INVALID_IMAGE.to_owned();
            }
            let text = text.map(str::trim).filter(|t| !t.is_empty());
            if wants_search && text.is_none() {
                return replies::SEARCH_NEEDS_TEXT.to_owned();
            }

            let prompt = match text {
                Some(t) if wants_search => self.augmenter.augment(t, AugmentContext::Image).await,
                Some(t) => t.to_owned(),
                None => replies::DEFAULT_VISION_PROMPT.to_owned(),
            };
            tracing::info!(prompt = %prompt, bytes = image.len(), "vision prompt");

            let req = VisionRequest {
                image,
                mime_type: mime_type.to_owned(),
                prompt,
            };
            match self.vision.describe(req).await {
                Ok(answer) => answer,
                Err(e) => {
                    tracing::warn!(error = %e, "vision completion failed");
                    replies::failure(Service::Vision, &e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Generate an image, retrying transient failures.
    pub async fn handle_image_generation_request(&self, prompt: &str) -> ImageReply {
        let span = tracing::info_span!("image_request", request_id = %Uuid::new_v4());
        async {
            if prompt.trim().is_empty() {
                return ImageReply::Failed(replies::EMPTY_IMAGE_PROMPT.to_owned());
            }

            let report = self
                .image_retry
                .run("image_generation", |attempt| {
                    tracing::info!(attempt, "requesting image");
                    self.images.synthesize(prompt)
                })
                .await;

            match report.result {
                Ok(bytes) => {
                    tracing::info!(attempts = report.attempts, bytes = bytes.len(), "image generated");
                    ImageReply::Image(bytes)
                }
                Err(RetryError::Terminal(e)) => ImageReply::Failed(replies::failure(Service::Image, &e)),
                Err(exhausted) => {
                    ImageReply::Failed(replies::failure(Service::Image, &exhausted.into_error()))
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Clear a scope's history and say whether there was anything to clear.
    pub async fn reset_scope(&self, scope: ConversationScope) -> Result<String> {
        let outcome = self.store.reset(scope).await?;
        Ok(replies::reset(scope, outcome))
    }
}
