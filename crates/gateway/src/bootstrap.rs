//! Orchestrator construction shared by every CLI command that talks to the
//! backends.

use std::sync::Arc;

use anyhow::Context;

use gr_domain::config::{Config, ConfigSeverity};
use gr_providers::{
    GeminiClient, GoogleSearchClient, ImagenClient, RetryExecutor, RetryPolicy,
};
use gr_sessions::{ConversationStore, HistoryBackend, JsonFileBackend, MemoryBackend};

use crate::runtime::{Backends, Orchestrator};

/// Log filter used when `RUST_LOG` is unset. Trace events from the store,
/// the provider clients and the retry loop are emitted at info level by
/// the library crates.
pub const DEFAULT_LOG_FILTER: &str =
    "warn,gr_gateway=info,gr_domain=info,gr_sessions=info,gr_providers=info";

/// Validate config, initialize every subsystem and return a fully-wired
/// [`Orchestrator`].
///
/// With `ephemeral` set, transcripts live in memory only and nothing is
/// written under the state path.
pub fn build_orchestrator(config: &Config, ephemeral: bool) -> anyhow::Result<Orchestrator> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let error_count = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if error_count > 0 {
        anyhow::bail!("config validation failed with {error_count} error(s)");
    }

    // ── Conversation store ───────────────────────────────────────────
    let backend: Arc<dyn HistoryBackend> = if ephemeral {
        Arc::new(MemoryBackend::new())
    } else {
        Arc::new(
            JsonFileBackend::from_config(&config.storage)
                .context("initializing history storage")?,
        )
    };
    tracing::info!(backend = %backend.describe(), "conversation store ready");
    let store = Arc::new(ConversationStore::new(backend));

    // ── Backend clients ──────────────────────────────────────────────
    let gemini = Arc::new(GeminiClient::from_config(&config.llm).context("building gemini client")?);
    let imagen = Arc::new(
        ImagenClient::from_config(&config.llm, &config.image).context("building imagen client")?,
    );
    let search =
        Arc::new(GoogleSearchClient::from_config(&config.search).context("building search client")?);

    tracing::info!(
        text_model = %config.llm.text_model,
        image_model = %config.image.model,
        llm_configured = gemini.is_configured(),
        search_configured = search.is_configured(),
        "backend clients ready"
    );

    let backends = Backends {
        text: gemini.clone(),
        vision: gemini,
        images: imagen,
        search,
    };
    let retry = RetryExecutor::new(RetryPolicy::from_config(&config.image));

    Ok(Orchestrator::new(
        store,
        backends,
        config.search.num_results,
        retry,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_config() {
        let mut config = Config::default();
        config.image.max_attempts = 0;
        let err = build_orchestrator(&config, true).err().unwrap();
        assert!(err.to_string().contains("1 error"));
    }

    #[derive(Clone)]
    struct Captured(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn default_filter_keeps_trace_events() {
        let captured = Captured(Arc::default());
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER))
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            gr_domain::trace::TraceEvent::RetryScheduled {
                operation: "image_generation".into(),
                attempt: 1,
                max_attempts: 3,
                delay_ms: 1200,
                error: "HTTP 503".into(),
            }
            .emit();
            tracing::info!(target: "hyper", "connection pooled");
        });

        let out = String::from_utf8(captured.0.lock().clone()).unwrap();
        assert!(out.contains("RetryScheduled"), "{out}");
        assert!(!out.contains("connection pooled"), "{out}");
    }

    #[test]
    fn ephemeral_store_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.state_path = dir.path().join("state");
        let orch = build_orchestrator(&config, true).unwrap();
        assert_eq!(orch.store().backend().describe(), "memory");
        assert!(!dir.path().join("state").exists());
    }
}
