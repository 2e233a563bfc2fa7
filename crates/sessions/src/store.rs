//! Conversation store: bounded per-scope transcripts with a write-through
//! cache.
//!
//! The durable backend is the source of truth. The cache is filled on the
//! first access to a scope and updated only after the backend accepted a
//! write, so it never holds anything that was not persisted.
//!
//! # Concurrency
//!
//! The cache lock is never held across an `.await`. A request reads the
//! transcript, awaits the backend, then writes the new transcript back;
//! two requests racing on the *same* scope can therefore interleave and
//! the last full write wins (one turn may be lost). Different scopes never
//! interfere. No lock spans a whole request.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use gr_domain::error::Result;
use gr_domain::trace::TraceEvent;
use gr_domain::{ConversationEntry, ConversationScope, Transcript};

use crate::backend::HistoryBackend;

/// Result of a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    /// The scope had history, which is now gone.
    Cleared { removed: usize },
    /// The scope had no history to begin with.
    AlreadyEmpty,
}

pub struct ConversationStore {
    backend: Arc<dyn HistoryBackend>,
    cache: RwLock<HashMap<ConversationScope, Transcript>>,
}

impl ConversationStore {
    pub fn new(backend: Arc<dyn HistoryBackend>) -> Self {
        Self {
            backend,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Return the transcript of a scope, loading it on first access.
    pub async fn get(&self, scope: ConversationScope) -> Result<Transcript> {
        // Fast path: return from cache.
        if let Some(t) = self.cache.read().get(&scope) {
            return Ok(t.clone());
        }

        // Slow path: load from the backend and populate the cache. A write
        // that landed while we were loading is newer, so keep it.
        let loaded = self.backend.load(scope).await?;
        TraceEvent::TranscriptLoaded {
            scope: scope.to_string(),
            entries: loaded.len(),
        }
        .emit();

        let mut cache = self.cache.write();
        Ok(cache.entry(scope).or_insert(loaded).clone())
    }

    /// Append an entry, evicting the oldest beyond the window, and persist
    /// the full transcript before returning.
    ///
    /// On a write failure the error is returned and the cached transcript
    /// stays at the last persisted value.
    pub async fn append(&self, scope: ConversationScope, entry: ConversationEntry) -> Result<()> {
        let role = entry.role();
        let next = self.get(scope).await?.with_entry(entry);

        if let Err(e) = self.backend.save(scope, &next).await {
            tracing::error!(scope = %scope, error = %e, "failed to persist transcript");
            return Err(e);
        }

        let len = next.len();
        self.cache.write().insert(scope, next);

        TraceEvent::TranscriptAppend {
            scope: scope.to_string(),
            role: role.as_str().to_owned(),
            entries: len,
        }
        .emit();

        Ok(())
    }

    /// Empty a scope's transcript in both the backend and the cache.
    pub async fn reset(&self, scope: ConversationScope) -> Result<ResetOutcome> {
        let removed = self.get(scope).await?.len();
        let empty = Transcript::new();

        if let Err(e) = self.backend.save(scope, &empty).await {
            tracing::error!(scope = %scope, error = %e, "failed to persist reset");
            return Err(e);
        }
        self.cache.write().insert(scope, empty);

        TraceEvent::TranscriptReset {
            scope: scope.to_string(),
            removed,
        }
        .emit();

        Ok(if removed > 0 {
            ResetOutcome::Cleared { removed }
        } else {
            ResetOutcome::AlreadyEmpty
        })
    }

    /// Number of scopes currently held in the cache.
    pub fn cached_scopes(&self) -> usize {
        self.cache.read().len()
    }

    pub fn backend(&self) -> &Arc<dyn HistoryBackend> {
        &self.backend
    }
}
