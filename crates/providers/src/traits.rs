use gr_domain::error::Result;
use gr_domain::ConversationEntry;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request / Response types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A single-turn multimodal request: one image plus a text prompt.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    /// Raw image bytes (encoded for the wire by the client).
    pub image: Vec<u8>,
    /// MIME type of `image`, e.g. `image/png`.
    pub mime_type: String,
    /// The (possibly search-augmented) prompt.
    pub prompt: String,
}

/// One web search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub link: String,
}

/// Outcome of a web search. Failures are values, not errors: callers
/// degrade to answering without search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// At least one result, in provider order.
    Hits(Vec<SearchHit>),
    /// API key or engine id missing.
    NotConfigured,
    /// The query was blank; nothing was sent.
    EmptyQuery,
    /// The provider call failed.
    ProviderError(String),
    /// The provider answered but had nothing.
    NoResults,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Backend traits
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Multi-turn text generation over a full transcript.
///
/// A policy refusal is reported as [`Error::ContentBlocked`] and an
/// unexpected payload as [`Error::MalformedResponse`].
///
/// [`Error::ContentBlocked`]: gr_domain::Error::ContentBlocked
/// [`Error::MalformedResponse`]: gr_domain::Error::MalformedResponse
#[async_trait::async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, transcript: &[ConversationEntry]) -> Result<String>;
}

/// Single-turn image understanding.
#[async_trait::async_trait]
pub trait VisionCompletion: Send + Sync {
    async fn describe(&self, req: VisionRequest) -> Result<String>;
}

/// Text-to-image generation. Returns decoded image bytes.
#[async_trait::async_trait]
pub trait ImageSynthesis: Send + Sync {
    async fn synthesize(&self, prompt: &str) -> Result<Vec<u8>>;
}

/// Web search used to augment prompts.
#[async_trait::async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str, count: u32) -> SearchOutcome;
}
