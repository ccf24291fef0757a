//! Integration tests for the retrieval orchestrator.
//!
//! These tests drive the full retry/fallback loop against a scripted
//! extraction engine, asserting on exact call counts: the orchestrator's
//! contract is as much about what it does NOT call as what it does.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use clipfetch_core::{
    BackoffPolicy, Dispatcher, ErrorKind, ExtractError, Extraction, Extractor, Orchestrator,
    OutputSlot, RetrievalRequest, StrategyConfig,
};
use tempfile::TempDir;

const YOUTUBE_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

/// One scripted engine response.
#[derive(Debug, Clone, Copy)]
enum Step {
    /// Write a file under the slot and report it.
    Succeed,
    /// Report the given stderr.
    Fail(&'static str),
    /// Write a file under the slot but report a path that does not exist.
    SucceedMisreported,
    /// Report success without writing anything.
    SucceedPhantom,
    /// Consume the whole attempt cap, then report the cap expired.
    SleepThrough,
}

/// Extraction engine stub driven by a response script.
///
/// Scripted steps are consumed in order; once exhausted, `default` repeats
/// forever. Every call increments the counter and records the slot template
/// it was handed.
struct ScriptedExtractor {
    steps: Mutex<VecDeque<Step>>,
    default: Step,
    calls: AtomicUsize,
    templates: Mutex<Vec<String>>,
}

impl ScriptedExtractor {
    fn new(steps: Vec<Step>, default: Step) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            default,
            calls: AtomicUsize::new(0),
            templates: Mutex::new(Vec::new()),
        }
    }

    fn always(default: Step) -> Self {
        Self::new(Vec::new(), default)
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn templates(&self) -> Vec<String> {
        self.templates.lock().unwrap().clone()
    }

    fn artifact_path(slot: &OutputSlot) -> PathBuf {
        PathBuf::from(
            slot.template()
                .replace("%(id)s", "dQw4w9WgXcQ")
                .replace("%(ext)s", "mp4"),
        )
    }
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn extract(
        &self,
        _url: &str,
        _strategy: &StrategyConfig,
        slot: &OutputSlot,
        cap: Duration,
    ) -> Result<Extraction, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.templates.lock().unwrap().push(slot.template());

        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.default);

        match step {
            Step::Succeed => {
                let path = Self::artifact_path(slot);
                std::fs::write(&path, b"retrieved media bytes").unwrap();
                Ok(Extraction {
                    file_path: path,
                    title: "Stub Clip".to_string(),
                })
            }
            Step::Fail(stderr) => Err(ExtractError::Failed {
                stderr: stderr.to_string(),
            }),
            Step::SucceedMisreported => {
                let path = Self::artifact_path(slot);
                std::fs::write(&path, b"retrieved media bytes").unwrap();
                Ok(Extraction {
                    file_path: slot.dir().join("somewhere_else.mp4"),
                    title: "Stub Clip".to_string(),
                })
            }
            Step::SucceedPhantom => Ok(Extraction {
                file_path: slot.dir().join("phantom.mp4"),
                title: "Stub Clip".to_string(),
            }),
            Step::SleepThrough => {
                let partial = PathBuf::from(
                    slot.template()
                        .replace("%(id)s", "dQw4w9WgXcQ")
                        .replace("%(ext)s", "mp4.part"),
                );
                std::fs::write(&partial, b"half written").unwrap();
                tokio::time::sleep(cap).await;
                Err(ExtractError::AttemptTimeout { limit: cap })
            }
        }
    }
}

/// Orchestrator with millisecond backoff so retry tests stay fast.
fn orchestrator(extractor: Arc<ScriptedExtractor>, dir: &TempDir) -> Orchestrator {
    Orchestrator::new(extractor, dir.path()).with_backoff(BackoffPolicy::new(
        Duration::from_millis(1),
        Duration::from_millis(2),
        1.0,
    ))
}

fn budget() -> Duration {
    Duration::from_secs(30)
}

// ==================== First Success Wins ====================

#[tokio::test]
async fn test_first_success_stops_the_pipeline() {
    let temp = TempDir::new().unwrap();
    let extractor = Arc::new(ScriptedExtractor::always(Step::Succeed));
    let orchestrator = orchestrator(Arc::clone(&extractor), &temp);
    let request = RetrievalRequest::new(YOUTUBE_URL);

    let outcome = orchestrator.retrieve(&request, budget()).await;

    let retrieved = outcome.unwrap();
    assert_eq!(extractor.calls(), 1, "no further strategies may be tried");
    assert!(retrieved.file_path.exists());
    assert_eq!(retrieved.title, "Stub Clip");
}

#[tokio::test]
async fn test_success_promotes_to_canonical_name() {
    let temp = TempDir::new().unwrap();
    let extractor = Arc::new(ScriptedExtractor::always(Step::Succeed));
    let orchestrator = orchestrator(Arc::clone(&extractor), &temp);
    let request = RetrievalRequest::new(YOUTUBE_URL);

    let retrieved = orchestrator.retrieve(&request, budget()).await.unwrap();

    assert_eq!(
        retrieved.file_path,
        temp.path().join("media_dQw4w9WgXcQ.mp4"),
        "nonce must be stripped after exclusive success"
    );
}

// ==================== Terminal Short-Circuit ====================

#[tokio::test]
async fn test_private_content_aborts_after_one_call() {
    let temp = TempDir::new().unwrap();
    let extractor = Arc::new(ScriptedExtractor::always(Step::Fail(
        "ERROR: Private video. Sign in if you've been granted access to this video",
    )));
    let orchestrator = orchestrator(Arc::clone(&extractor), &temp);
    let request = RetrievalRequest::new(YOUTUBE_URL);

    let failure = orchestrator.retrieve(&request, budget()).await.unwrap_err();

    assert_eq!(extractor.calls(), 1, "no retries, no fallback strategies");
    assert_eq!(failure.kind, ErrorKind::ContentPrivate);
}

#[tokio::test]
async fn test_unavailable_content_aborts_after_one_call() {
    let temp = TempDir::new().unwrap();
    let extractor = Arc::new(ScriptedExtractor::always(Step::Fail(
        "ERROR: Video unavailable",
    )));
    let orchestrator = orchestrator(Arc::clone(&extractor), &temp);
    let request = RetrievalRequest::new(YOUTUBE_URL);

    let failure = orchestrator.retrieve(&request, budget()).await.unwrap_err();

    assert_eq!(extractor.calls(), 1);
    assert_eq!(failure.kind, ErrorKind::ContentUnavailable);
}

// ==================== Retry Budget Bound ====================

#[tokio::test]
async fn test_transient_failures_consume_exactly_the_budgets() {
    let temp = TempDir::new().unwrap();
    let extractor = Arc::new(ScriptedExtractor::always(Step::Fail(
        "Connection reset by peer",
    )));
    let orchestrator = orchestrator(Arc::clone(&extractor), &temp);
    let request = RetrievalRequest::new(YOUTUBE_URL);

    let expected: u32 = clipfetch_core::strategies_for(&request.canonical_url)
        .iter()
        .map(|strategy| strategy.retry_budget)
        .sum();

    let failure = orchestrator.retrieve(&request, budget()).await.unwrap_err();

    assert_eq!(extractor.calls() as u32, expected);
    assert_eq!(failure.kind, ErrorKind::Unknown);
    assert!(failure.detail.contains("all strategies exhausted"));
}

// ==================== Fallback Escalation ====================

#[tokio::test]
async fn test_no_playable_format_skips_to_next_strategy() {
    let temp = TempDir::new().unwrap();
    // Strategy 1 reports no formats; its remaining retry budget must NOT be
    // spent. Strategy 2 succeeds.
    let extractor = Arc::new(ScriptedExtractor::new(
        vec![
            Step::Fail("ERROR: Requested format is not available"),
            Step::Succeed,
        ],
        Step::Fail("should not be reached"),
    ));
    let orchestrator = orchestrator(Arc::clone(&extractor), &temp);
    let request = RetrievalRequest::new(YOUTUBE_URL);

    let outcome = orchestrator.retrieve(&request, budget()).await;

    assert!(outcome.is_ok());
    assert_eq!(extractor.calls(), 2);
}

#[tokio::test]
async fn test_phantom_success_escalates() {
    let temp = TempDir::new().unwrap();
    // A reported success with nothing on disk is not trusted.
    let extractor = Arc::new(ScriptedExtractor::new(
        vec![Step::SucceedPhantom, Step::Succeed],
        Step::Fail("should not be reached"),
    ));
    let orchestrator = orchestrator(Arc::clone(&extractor), &temp);
    let request = RetrievalRequest::new(YOUTUBE_URL);

    let outcome = orchestrator.retrieve(&request, budget()).await;

    assert!(outcome.is_ok());
    assert_eq!(extractor.calls(), 2);
}

// ==================== File Recovery ====================

#[tokio::test]
async fn test_misreported_path_recovers_from_slot() {
    let temp = TempDir::new().unwrap();
    let extractor = Arc::new(ScriptedExtractor::always(Step::SucceedMisreported));
    let orchestrator = orchestrator(Arc::clone(&extractor), &temp);
    let request = RetrievalRequest::new(YOUTUBE_URL);

    let retrieved = orchestrator.retrieve(&request, budget()).await.unwrap();

    assert_eq!(extractor.calls(), 1);
    assert!(retrieved.file_path.exists());
}

// ==================== Unknown Platform ====================

#[tokio::test]
async fn test_unknown_platform_uses_generic_strategy() {
    let temp = TempDir::new().unwrap();
    let extractor = Arc::new(ScriptedExtractor::always(Step::Succeed));
    let orchestrator = orchestrator(Arc::clone(&extractor), &temp);
    let request = RetrievalRequest::new("https://random-site.example/clip.mp4");

    let outcome = orchestrator.retrieve(&request, budget()).await;

    assert!(outcome.is_ok());
    assert_eq!(extractor.calls(), 1);
}

// ==================== Wall-Clock Timeout ====================

#[tokio::test]
async fn test_expired_budget_is_timeout_with_no_partials() {
    let temp = TempDir::new().unwrap();
    let extractor = Arc::new(ScriptedExtractor::always(Step::SleepThrough));
    let orchestrator = orchestrator(Arc::clone(&extractor), &temp);
    let request = RetrievalRequest::new(YOUTUBE_URL);

    let failure = orchestrator
        .retrieve(&request, Duration::from_millis(100))
        .await
        .unwrap_err();

    assert_eq!(failure.kind, ErrorKind::Timeout);
    assert_eq!(extractor.calls(), 1, "in-flight work is abandoned, not retried");

    let leftovers: Vec<_> = std::fs::read_dir(temp.path()).unwrap().collect();
    assert!(leftovers.is_empty(), "no partial file may survive a timeout");
}

// ==================== Concurrent Identical URLs ====================

#[tokio::test]
async fn test_concurrent_identical_urls_never_share_paths() {
    let temp = TempDir::new().unwrap();
    let extractor = Arc::new(ScriptedExtractor::always(Step::Succeed));
    let orchestrator = Arc::new(orchestrator(Arc::clone(&extractor), &temp));

    let first_request = RetrievalRequest::new(YOUTUBE_URL);
    let second_request = RetrievalRequest::new(YOUTUBE_URL);
    let (first, second) = tokio::join!(
        orchestrator.retrieve(&first_request, budget()),
        orchestrator.retrieve(&second_request, budget()),
    );

    let first = first.unwrap();
    let second = second.unwrap();

    let templates = extractor.templates();
    assert_eq!(templates.len(), 2);
    assert_ne!(
        templates[0], templates[1],
        "request-scoped naming must differ even for identical URLs"
    );

    assert_ne!(first.file_path, second.file_path);
    assert!(first.file_path.exists());
    assert!(second.file_path.exists());
}

// ==================== Dispatcher Hand-Off ====================

#[tokio::test]
async fn test_dispatcher_completes_requests_beyond_pool_bound() {
    let temp = TempDir::new().unwrap();
    let extractor = Arc::new(ScriptedExtractor::always(Step::Succeed));
    let orchestrator = Arc::new(orchestrator(Arc::clone(&extractor), &temp));
    let dispatcher = Dispatcher::new(1);

    let handles: Vec<_> = (0..3)
        .map(|_| {
            dispatcher.dispatch(
                Arc::clone(&orchestrator),
                RetrievalRequest::new(YOUTUBE_URL),
                budget(),
            )
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }
    assert_eq!(extractor.calls(), 3);
}
