//! Durable backing for the conversation store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use gr_domain::error::{Error, Result};
use gr_domain::{ConversationScope, Transcript};

/// Where transcripts live between process restarts.
///
/// Implementations treat absent and unreadable records the same way:
/// `load` logs the problem and returns an empty transcript. Only real I/O
/// failures are reported as errors.
#[async_trait]
pub trait HistoryBackend: Send + Sync {
    /// Load the persisted transcript of a scope.
    async fn load(&self, scope: ConversationScope) -> Result<Transcript>;

    /// Replace the persisted transcript of a scope with `transcript`.
    async fn save(&self, scope: ConversationScope, transcript: &Transcript) -> Result<()>;

    /// Short description for diagnostics (e.g. a path).
    fn describe(&self) -> String;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// In-memory backend
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Process-local backend for tests and ephemeral runs.
///
/// Write failures can be injected with [`MemoryBackend::fail_writes`].
#[derive(Default)]
pub struct MemoryBackend {
    records: Mutex<HashMap<ConversationScope, Transcript>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `save` fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// What is currently persisted for `scope`.
    pub fn stored(&self, scope: ConversationScope) -> Option<Transcript> {
        self.records.lock().get(&scope).cloned()
    }
}

#[async_trait]
impl HistoryBackend for MemoryBackend {
    async fn load(&self, scope: ConversationScope) -> Result<Transcript> {
        Ok(self.records.lock().get(&scope).cloned().unwrap_or_default())
    }

    async fn save(&self, scope: ConversationScope, transcript: &Transcript) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Storage(format!("injected write failure for {scope}")));
        }
        self.records.lock().insert(scope, transcript.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".into()
    }
}
