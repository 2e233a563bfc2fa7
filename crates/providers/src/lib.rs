pub mod google;
pub mod imagen;
pub mod retry;
pub mod search;
pub mod traits;
pub mod util;

// Re-exports for convenience.
pub use google::{GeminiClient, GeminiReply};
pub use imagen::{ImagenClient, ImagenReply};
pub use retry::{
    RecordingSleeper, RetryError, RetryExecutor, RetryPolicy, RetryReport, Sleeper, TokioSleeper,
};
pub use search::GoogleSearchClient;
pub use traits::{
    ImageSynthesis, SearchHit, SearchOutcome, TextCompletion, VisionCompletion, VisionRequest,
    WebSearch,
};
