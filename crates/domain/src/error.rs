/// Shared error type used across all gemrelay crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Network-level failure (connect, DNS, body read).
    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    /// The provider answered with a non-2xx status.
    #[error("provider {provider}: HTTP {status} - {message}")]
    Transport {
        provider: String,
        status: u16,
        message: String,
    },

    /// The provider refused the request for policy reasons. Never retried.
    #[error("provider {provider} blocked the request: {reason}")]
    ContentBlocked { provider: String, reason: String },

    #[error("provider {provider} returned an unexpected response: {detail}")]
    MalformedResponse { provider: String, detail: String },

    #[error("no image data in response: {0}")]
    NoImageData(String),

    /// A credential is absent or still set to its placeholder value.
    #[error("not configured: {0}")]
    NotConfigured(String),

    #[error("gave up after {attempts} attempts: {last}")]
    RetryExhausted { attempts: u32, last: String },

    #[error("config: {0}")]
    Config(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether a retry of the same request has a chance of succeeding.
    ///
    /// Policy blocks and missing credentials are terminal. Client errors
    /// (4xx) are terminal except request timeout (408) and rate limiting
    /// (429).
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) | Error::Timeout(_) => true,
            Error::Transport { status, .. } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            Error::MalformedResponse { .. } | Error::NoImageData(_) => true,
            Error::ContentBlocked { .. } | Error::NotConfigured(_) => false,
            Error::RetryExhausted { .. } | Error::Config(_) => false,
            Error::Io(_) | Error::Json(_) | Error::Storage(_) | Error::Other(_) => false,
        }
    }

    /// Persistence failures are the only errors that fail a request
    /// outright instead of being turned into a reply.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Error::Io(_) | Error::Json(_) | Error::Storage(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
