use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use gr_domain::config::{CredentialConfig, ImageConfig, LlmConfig, SearchConfig};
use gr_domain::{ConversationEntry, ConversationScope, Error, Result, Role};
use gr_gateway::runtime::{Backends, ImageReply, Orchestrator};
use gr_providers::{
    GoogleSearchClient, ImageSynthesis, ImagenClient, RecordingSleeper, RetryExecutor, RetryPolicy, SearchHit, SearchOutcome,
    TextCompletion, VisionCompletion, VisionRequest, WebSearch,
};
use gr_sessions::{ConversationStore, JsonFileBackend, MemoryBackend};

// ── Fakes ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct ScriptedText {
    replies: Mutex<VecDeque<Result<String>>>,
    seen: Mutex<Vec<Vec<ConversationEntry>>>,
}

impl ScriptedText {
    fn with(replies: Vec<Result<String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait::async_trait]
impl TextCompletion for ScriptedText {
    async fn complete(&self, transcript: &[ConversationEntry]) -> Result<String> {
        self.seen.lock().push(transcript.to_vec());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Other("no scripted reply".into())))
    }
}

#[derive(Default)]
struct EchoVision {
    seen: Mutex<Vec<VisionRequest>>,
}

#[async_trait::async_trait]
impl VisionCompletion for EchoVision {
    async fn describe(&self, req: VisionRequest) -> Result<String> {
        let answer = format!("saw {} bytes: {}", req.image.len(), req.prompt);
        self.seen.lock().push(req);
        Ok(answer)
    }
}

struct FlakyImages {
    failures_left: AtomicU32,
    calls: AtomicU32,
}

impl FlakyImages {
    fn failing(times: u32) -> Arc<Self> {
        Arc::new(Self {
            failures_left: AtomicU32::new(times),
            calls: AtomicU32::new(0),
        })
    }
}

#[async_trait::async_trait]
impl ImageSynthesis for FlakyImages {
    async fn synthesize(&self, _prompt: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failures_left.load(Ordering::SeqCst) > 0 {
            self.failures_left.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::NoImageData("No image data in response.".into()));
        }
        Ok(vec![0x89, b'P', b'N', b'G'])
    }
}

struct BlockedImages;

#[async_trait::async_trait]
impl ImageSynthesis for BlockedImages {
    async fn synthesize(&self, _prompt: &str) -> Result<Vec<u8>> {
        Err(Error::ContentBlocked {
            provider: "imagen".into(),
            reason: "SAFETY".into(),
        })
    }
}

struct FixedSearch(SearchOutcome);

#[async_trait::async_trait]
impl WebSearch for FixedSearch {
    async fn search(&self, _query: &str, _count: u32) -> SearchOutcome {
        self.0.clone()
    }
}

struct Harness {
    orchestrator: Orchestrator,
    backend: Arc<MemoryBackend>,
    text: Arc<ScriptedText>,
    vision: Arc<EchoVision>,
    sleeper: Arc<RecordingSleeper>,
}

fn harness(
    text: Arc<ScriptedText>,
    images: Arc<dyn ImageSynthesis>,
    search: SearchOutcome,
) -> Harness {
    let backend = Arc::new(MemoryBackend::new());
    let store = Arc::new(ConversationStore::new(backend.clone()));
    let vision = Arc::new(EchoVision::default());
    let sleeper = Arc::new(RecordingSleeper::new());
    let retry = RetryExecutor::with_sleeper(RetryPolicy::default(), sleeper.clone());
    let backends = Backends {
        text: text.clone(),
        vision: vision.clone(),
        images,
        search: Arc::new(FixedSearch(search)),
    };
    Harness {
        orchestrator: Orchestrator::new(store, backends, 3, retry),
        backend,
        text,
        vision,
        sleeper,
    }
}

fn simple(text: Arc<ScriptedText>) -> Harness {
    harness(text, FlakyImages::failing(0), SearchOutcome::NoResults)
}

// ── Text ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn private_conversation_records_both_turns() {
    let h = simple(ScriptedText::with(vec![Ok("hi there".into())]));
    let scope = ConversationScope::Private(42);

    let reply = h
        .orchestrator
        .handle_text_request(scope, "hello", false)
        .await
        .unwrap();
    assert_eq!(reply, "hi there");

    let stored = h.backend.stored(scope).unwrap();
    let turns: Vec<(Role, &str)> = stored.entries().iter().map(|e| (e.role(), e.text())).collect();
    assert_eq!(turns, vec![(Role::User, "hello"), (Role::Model, "hi there")]);
}

#[tokio::test]
async fn backend_sees_full_history() {
    let h = simple(ScriptedText::with(vec![Ok("one".into()), Ok("two".into())]));
    let scope = ConversationScope::Shared(7);
    h.orchestrator.handle_text_request(scope, "a", false).await.unwrap();
    h.orchestrator.handle_text_request(scope, "b", false).await.unwrap();

    let seen = h.text.seen.lock();
    assert_eq!(seen[0].len(), 1);
    let second: Vec<&str> = seen[1].iter().map(|e| e.text()).collect();
    assert_eq!(second, vec!["a", "one", "b"]);
}

#[tokio::test]
async fn blocked_reply_keeps_only_user_turn() {
    let h = simple(ScriptedText::with(vec![Err(Error::ContentBlocked {
        provider: "gemini".into(),
        reason: "SAFETY".into(),
    })]));
    let scope = ConversationScope::Private(9);

    let reply = h
        .orchestrator
        .handle_text_request(scope, "something bad", false)
        .await
        .unwrap();
    assert!(reply.contains("blocked"));
    assert!(reply.contains("SAFETY"));

    let stored = h.backend.stored(scope).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored.entries()[0].role(), Role::User);
}

#[tokio::test]
async fn transport_error_becomes_message() {
    let h = simple(ScriptedText::with(vec![Err(Error::Transport {
        provider: "gemini".into(),
        status: 500,
        message: "internal".into(),
    })]));
    let reply = h
        .orchestrator
        .handle_text_request(ConversationScope::Shared(1), "hi", false)
        .await
        .unwrap();
    assert!(reply.contains("HTTP 500"));
}

#[tokio::test]
async fn persistence_failure_is_an_error() {
    let h = simple(ScriptedText::with(vec![Ok("unused".into())]));
    h.backend.fail_writes(true);
    let err = h
        .orchestrator
        .handle_text_request(ConversationScope::Private(1), "hi", false)
        .await
        .unwrap_err();
    assert!(err.is_persistence());
    assert!(h.text.seen.lock().is_empty());
}

#[tokio::test]
async fn search_rewrites_the_recorded_user_turn() {
    let hits = SearchOutcome::Hits(vec![SearchHit {
        title: "Rust".into(),
        snippet: "A language".into(),
        link: "https://rust-lang.org".into(),
    }]);
    let h = harness(
        ScriptedText::with(vec![Ok("ok".into())]),
        FlakyImages::failing(0),
        hits,
    );
    let scope = ConversationScope::Shared(3);
    h.orchestrator.handle_text_request(scope, "what is rust", true).await.unwrap();

    let stored = h.backend.stored(scope).unwrap();
    let user = stored.entries()[0].text();
    assert!(user.starts_with("Web Search Results:\n1. Rust: A language (Source: https://rust-lang.org)"));
    assert!(user.ends_with("Based on these results, please answer: what is rust"));
}

#[tokio::test]
async fn history_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let scope = ConversationScope::Private(42);
    let build = |text: Arc<ScriptedText>| {
        let backend = JsonFileBackend::new(
            &dir.path().join("conversation_histories.json"),
            &dir.path().join("dm_histories"),
        )
        .unwrap();
        let store = Arc::new(ConversationStore::new(Arc::new(backend)));
        let backends = Backends {
            text,
            vision: Arc::new(EchoVision::default()),
            images: FlakyImages::failing(0),
            search: Arc::new(FixedSearch(SearchOutcome::NoResults)),
        };
        Orchestrator::new(store, backends, 3, RetryExecutor::new(RetryPolicy::default()))
    };

    let first = build(ScriptedText::with(vec![Ok("hi there".into())]));
    first.handle_text_request(scope, "hello", false).await.unwrap();
    drop(first);

    let text = ScriptedText::with(vec![Ok("again".into())]);
    let second = build(text.clone());
    second.handle_text_request(scope, "remember me?", false).await.unwrap();
    let seen: Vec<String> = text.seen.lock()[0]
        .iter()
        .map(|e| e.text().to_owned())
        .collect();
    assert_eq!(seen, vec!["hello", "hi there", "remember me?"]);
}

// ── Vision ────────────────────────────────────────────────────────────

#[tokio::test]
async fn vision_defaults_prompt_and_skips_history() {
    let h = simple(ScriptedText::with(vec![]));
    let reply = h
        .orchestrator
        .handle_vision_request(vec![1, 2, 3], "image/png", None, false)
        .await;
    assert_eq!(reply, "saw 3 bytes: Describe this image.");
    assert_eq!(h.backend.write_count(), 0);
    assert_eq!(h.orchestrator.store().cached_scopes(), 0);
}

#[tokio::test]
async fn vision_rejects_non_images_and_search_without_text() {
    let h = simple(ScriptedText::with(vec![]));
    let reply = h
        .orchestrator
        .handle_vision_request(vec![1], "application/pdf", Some("what"), false)
        .await;
    assert!(reply.contains("valid image"));

    let reply = h
        .orchestrator
        .handle_vision_request(vec![1], "image/jpeg", Some("   "), true)
        .await;
    assert!(reply.contains("provide some text"));
    assert!(h.vision.seen.lock().is_empty());
}

#[tokio::test]
async fn vision_search_uses_image_wording() {
    let h = harness(
        ScriptedText::with(vec![]),
        FlakyImages::failing(0),
        SearchOutcome::NotConfigured,
    );
    h.orchestrator
        .handle_vision_request(vec![1], "image/jpeg", Some("what breed?"), true)
        .await;
    let prompt = h.vision.seen.lock()[0].prompt.clone();
    assert!(prompt.contains("(related to the image)"));
    assert!(prompt.contains("Search is not configured by the bot owner."));
}

// ── Image generation ──────────────────────────────────────────────────

#[tokio::test]
async fn image_succeeds_on_third_attempt() {
    let images = FlakyImages::failing(2);
    let h = harness(ScriptedText::with(vec![]), images.clone(), SearchOutcome::NoResults);

    let reply = h.orchestrator.handle_image_generation_request("a lighthouse").await;
    assert_eq!(reply, ImageReply::Image(vec![0x89, b'P', b'N', b'G']));
    assert_eq!(images.calls.load(Ordering::SeqCst), 3);

    let delays = h.sleeper.delays();
    assert_eq!(delays.len(), 2);
    assert!(delays[0] >= Duration::from_secs(1) && delays[0] < Duration::from_secs(2));
    assert!(delays[1] >= Duration::from_secs(2) && delays[1] < Duration::from_secs(3));
}

#[tokio::test]
async fn image_gives_up_after_three_attempts() {
    let images = FlakyImages::failing(5);
    let h = harness(ScriptedText::with(vec![]), images.clone(), SearchOutcome::NoResults);

    match h.orchestrator.handle_image_generation_request("a lighthouse").await {
        ImageReply::Failed(msg) => assert!(msg.contains("after 3 attempts")),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(images.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn blocked_image_is_not_retried() {
    let h = harness(ScriptedText::with(vec![]), Arc::new(BlockedImages), SearchOutcome::NoResults);
    match h.orchestrator.handle_image_generation_request("x").await {
        ImageReply::Failed(msg) => assert!(msg.contains("SAFETY")),
        other => panic!("unexpected {other:?}"),
    }
    assert!(h.sleeper.delays().is_empty());
}

#[tokio::test]
async fn blank_image_prompt_is_rejected() {
    let images = FlakyImages::failing(0);
    let h = harness(ScriptedText::with(vec![]), images.clone(), SearchOutcome::NoResults);
    assert!(matches!(
        h.orchestrator.handle_image_generation_request("  ").await,
        ImageReply::Failed(_)
    ));
    assert_eq!(images.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unreachable_providers_keep_keys_out_of_replies_and_history() {
    let unreachable = "http://127.0.0.1:9";
    let llm = LlmConfig {
        base_url: unreachable.into(),
        auth: CredentialConfig {
            key: Some("GEMINISECRET456".into()),
            ..Default::default()
        },
        ..Default::default()
    };
    let search = SearchConfig {
        base_url: unreachable.into(),
        auth: CredentialConfig {
            key: Some("SEARCHSECRET123".into()),
            ..Default::default()
        },
        engine_id: CredentialConfig {
            key: Some("cx1".into()),
            ..Default::default()
        },
        ..Default::default()
    };

    let backend = Arc::new(MemoryBackend::new());
    let store = Arc::new(ConversationStore::new(backend.clone()));
    let sleeper = Arc::new(RecordingSleeper::new());
    let backends = Backends {
        text: ScriptedText::with(vec![Ok("ok".into())]),
        vision: Arc::new(EchoVision::default()),
        images: Arc::new(ImagenClient::from_config(&llm, &ImageConfig::default()).unwrap()),
        search: Arc::new(GoogleSearchClient::from_config(&search).unwrap()),
    };
    let orchestrator = Orchestrator::new(
        store,
        backends,
        3,
        RetryExecutor::with_sleeper(RetryPolicy::default(), sleeper),
    );

    match orchestrator.handle_image_generation_request("a lighthouse").await {
        ImageReply::Failed(msg) => {
            assert!(msg.contains("after 3 attempts"), "{msg}");
            assert!(!msg.contains("GEMINISECRET456"), "{msg}");
        }
        other => panic!("unexpected {other:?}"),
    }

    let scope = ConversationScope::Private(9);
    orchestrator.handle_text_request(scope, "rust", true).await.unwrap();
    let stored = backend.stored(scope).unwrap();
    let user = stored.entries()[0].text();
    assert!(user.contains("An error occurred while trying to search"), "{user}");
    assert!(!user.contains("SEARCHSECRET123"), "{user}");
}

// ── Reset ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn reset_reports_cleared_then_empty() {
    let h = simple(ScriptedText::with(vec![Ok("hi".into())]));
    let scope = ConversationScope::Shared(5);
    h.orchestrator.handle_text_request(scope, "hello", false).await.unwrap();

    let first = h.orchestrator.reset_scope(scope).await.unwrap();
    assert!(first.contains("has been reset"));
    assert!(h.backend.stored(scope).unwrap().is_empty());

    let second = h.orchestrator.reset_scope(scope).await.unwrap();
    assert!(second.contains("no conversation history"));
}
