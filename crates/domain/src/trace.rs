use serde::Serialize;

/// Structured trace events emitted across all gemrelay crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    TranscriptLoaded {
        scope: String,
        entries: usize,
    },
    TranscriptAppend {
        scope: String,
        role: String,
        entries: usize,
    },
    TranscriptReset {
        scope: String,
        removed: usize,
    },
    LlmRequest {
        provider: String,
        model: String,
        turns: usize,
        duration_ms: u64,
        outcome: String,
    },
    SearchRequest {
        provider: String,
        results: usize,
        duration_ms: u64,
    },
    RetryScheduled {
        operation: String,
        attempt: u32,
        max_attempts: u32,
        delay_ms: u64,
        error: String,
    },
    RetryGaveUp {
        operation: String,
        attempts: u32,
        error: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "gr_event");
    }
}
