//! Retrieval orchestration: the retry/fallback engine.
//!
//! One [`RetrievalRequest`] is resolved by walking the platform's strategy
//! list in order, retrying each strategy within its budget, escalating to
//! the next on exhaustion, and short-circuiting the whole pipeline the
//! moment a failure classifies as terminal. First success wins; there is no
//! best-of-all comparison.
//!
//! # Architecture
//!
//! - [`Orchestrator`] - the two-level retry/fallback loop
//! - [`classify`]/[`ErrorKind`] - raw errors onto the closed taxonomy
//! - [`BackoffPolicy`] - bounded in-strategy retry delays
//! - [`OutputSlot`] - collision-free output naming, recovery, cleanup
//! - [`enforce_ceiling`] - the caller-facing size gate

mod backoff;
mod classify;
mod files;
mod gate;

pub use backoff::BackoffPolicy;
pub use classify::{Disposition, ErrorKind, MAX_DETAIL_LEN, classify, truncate_detail};
pub use files::OutputSlot;
pub use gate::{DEFAULT_SIZE_CEILING, enforce_ceiling};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::extract::{ExtractError, Extraction, Extractor};
use crate::normalize::normalize;
use crate::platform::Platform;
use crate::strategy::strategies_for;

/// An inbound retrieval, canonicalized exactly once at construction.
///
/// Immutable for its whole life; discarded once a terminal outcome exists.
#[derive(Debug, Clone)]
pub struct RetrievalRequest {
    /// The link exactly as the caller supplied it.
    pub raw_url: String,
    /// Normalized form all platform/strategy decisions are made from.
    pub canonical_url: String,
    /// Platform classification of the canonical URL.
    pub platform: Platform,
    /// When the request entered the pipeline.
    pub created_at: SystemTime,
}

impl RetrievalRequest {
    /// Builds a request, running the normalizer exactly once.
    #[must_use]
    pub fn new(raw_url: impl Into<String>) -> Self {
        let raw_url = raw_url.into();
        let canonical_url = normalize(&raw_url);
        let platform = Platform::detect(&canonical_url);
        Self {
            raw_url,
            canonical_url,
            platform,
            created_at: SystemTime::now(),
        }
    }
}

/// A successfully retrieved artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retrieved {
    /// Location of the artifact on disk.
    pub file_path: PathBuf,
    /// Media title as the platform publishes it.
    pub title: String,
}

/// A classified terminal failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {detail}")]
pub struct RetrievalFailure {
    /// Position in the closed error taxonomy.
    pub kind: ErrorKind,
    /// Bounded human-readable diagnostic.
    pub detail: String,
}

impl RetrievalFailure {
    /// Creates a failure, clipping the diagnostic to its bounded length.
    #[must_use]
    pub fn new(kind: ErrorKind, detail: impl AsRef<str>) -> Self {
        Self {
            kind,
            detail: truncate_detail(detail.as_ref()),
        }
    }
}

/// Terminal value of one retrieval: exactly a file or a classified failure.
pub type RetrievalOutcome = Result<Retrieved, RetrievalFailure>;

/// How a single attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The engine reported success and the artifact was where it said.
    Success,
    /// The engine reported success, the expected path was missing, and the
    /// output-directory scan found a candidate. Non-authoritative.
    RecoveredSuccess,
    /// Failure eligible for retry or escalation.
    RetryableFailure,
    /// Failure that aborted the pipeline.
    TerminalFailure,
}

/// Observability record for one attempt.
///
/// Lives only for the duration of one request's resolution; logged at
/// debug level and discarded, never persisted.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    /// Index into the platform's strategy list.
    pub strategy_index: usize,
    /// 1-indexed attempt within the strategy's retry budget.
    pub attempt_number: u32,
    /// When the attempt started.
    pub started_at: SystemTime,
    /// How the attempt ended.
    pub outcome: AttemptOutcome,
    /// Raw engine error, when the attempt failed.
    pub raw_error: Option<String>,
}

/// The retry/fallback engine.
///
/// Stateless across requests: every retrieval gets its own [`OutputSlot`]
/// and attempt log, so concurrent retrievals share nothing mutable.
pub struct Orchestrator {
    extractor: Arc<dyn Extractor>,
    output_dir: PathBuf,
    backoff: BackoffPolicy,
}

impl Orchestrator {
    /// Creates an orchestrator writing artifacts into `output_dir`.
    #[must_use]
    pub fn new(extractor: Arc<dyn Extractor>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            extractor,
            output_dir: output_dir.into(),
            backoff: BackoffPolicy::default(),
        }
    }

    /// Replaces the retry backoff schedule.
    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// The shared output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Resolves one request to a terminal outcome.
    ///
    /// `max_wall_time` bounds the total time across all strategies and
    /// attempts; on expiry the in-flight extraction is abandoned and the
    /// outcome is `Failure { Timeout }`. No partial artifact survives a
    /// failure return.
    #[instrument(
        skip(self, request),
        fields(url = %request.canonical_url, platform = %request.platform)
    )]
    pub async fn retrieve(
        &self,
        request: &RetrievalRequest,
        max_wall_time: Duration,
    ) -> RetrievalOutcome {
        let deadline = Instant::now() + max_wall_time;
        let strategies = strategies_for(&request.canonical_url);
        let slot = OutputSlot::new(&self.output_dir);
        let mut attempts: Vec<AttemptRecord> = Vec::new();

        'strategies: for (strategy_index, strategy) in strategies.iter().enumerate() {
            for attempt_number in 1..=strategy.retry_budget {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return fail(
                        &slot,
                        &attempts,
                        ErrorKind::Timeout,
                        format!("wall-clock budget of {max_wall_time:?} expired"),
                    );
                }

                let started_at = SystemTime::now();
                debug!(
                    strategy = strategy.name,
                    attempt = attempt_number,
                    remaining_ms = remaining.as_millis() as u64,
                    "extraction attempt"
                );

                match self
                    .extractor
                    .extract(&request.canonical_url, strategy, &slot, remaining)
                    .await
                {
                    Ok(extraction) => {
                        match settle_success(
                            extraction,
                            &slot,
                            strategy_index,
                            attempt_number,
                            started_at,
                            &mut attempts,
                        ) {
                            Some(retrieved) => {
                                log_attempts(&attempts);
                                info!(
                                    file = %retrieved.file_path.display(),
                                    strategy = strategy.name,
                                    "retrieval succeeded"
                                );
                                return Ok(retrieved);
                            }
                            // Reported success with nothing on disk: the
                            // report is not trusted, escalate.
                            None => continue 'strategies,
                        }
                    }
                    Err(ExtractError::AttemptTimeout { .. }) => {
                        attempts.push(AttemptRecord {
                            strategy_index,
                            attempt_number,
                            started_at,
                            outcome: AttemptOutcome::TerminalFailure,
                            raw_error: Some("attempt cap expired".to_string()),
                        });
                        return fail(
                            &slot,
                            &attempts,
                            ErrorKind::Timeout,
                            format!("wall-clock budget of {max_wall_time:?} expired"),
                        );
                    }
                    Err(error) => {
                        let raw = error.to_string();
                        let kind = classify(&raw);
                        debug!(strategy = strategy.name, kind = %kind, error = %raw, "attempt failed");

                        match kind.disposition() {
                            Disposition::Terminal => {
                                attempts.push(AttemptRecord {
                                    strategy_index,
                                    attempt_number,
                                    started_at,
                                    outcome: AttemptOutcome::TerminalFailure,
                                    raw_error: Some(raw.clone()),
                                });
                                return fail(&slot, &attempts, kind, raw);
                            }
                            Disposition::Retry => {
                                attempts.push(AttemptRecord {
                                    strategy_index,
                                    attempt_number,
                                    started_at,
                                    outcome: AttemptOutcome::RetryableFailure,
                                    raw_error: Some(raw),
                                });
                                if attempt_number < strategy.retry_budget {
                                    let delay = self
                                        .backoff
                                        .delay_for(attempt_number)
                                        .min(deadline.saturating_duration_since(Instant::now()));
                                    tokio::time::sleep(delay).await;
                                }
                                // Budget exhausted: the inner loop ends and
                                // the next strategy takes over (fallback
                                // escalation, distinct from in-place retry).
                            }
                            Disposition::Escalate => {
                                attempts.push(AttemptRecord {
                                    strategy_index,
                                    attempt_number,
                                    started_at,
                                    outcome: AttemptOutcome::RetryableFailure,
                                    raw_error: Some(raw),
                                });
                                continue 'strategies;
                            }
                        }
                    }
                }
            }
        }

        fail(&slot, &attempts, ErrorKind::Unknown, "all strategies exhausted")
    }
}

/// Verifies a reported success against the filesystem.
///
/// The reported path is authoritative when it exists; otherwise the slot
/// scan is a best-effort recovery recorded as non-authoritative. `None`
/// means nothing usable is on disk and the attempt counts as failed.
fn settle_success(
    extraction: Extraction,
    slot: &OutputSlot,
    strategy_index: usize,
    attempt_number: u32,
    started_at: SystemTime,
    attempts: &mut Vec<AttemptRecord>,
) -> Option<Retrieved> {
    if extraction.file_path.is_file() {
        let file_path = slot.promote(&extraction.file_path);
        attempts.push(AttemptRecord {
            strategy_index,
            attempt_number,
            started_at,
            outcome: AttemptOutcome::Success,
            raw_error: None,
        });
        return Some(Retrieved {
            file_path,
            title: extraction.title,
        });
    }

    if let Some(found) = slot.recover() {
        warn!(
            reported = %extraction.file_path.display(),
            recovered = %found.display(),
            "reported artifact missing, recovered most recent file"
        );
        let file_path = slot.promote(&found);
        attempts.push(AttemptRecord {
            strategy_index,
            attempt_number,
            started_at,
            outcome: AttemptOutcome::RecoveredSuccess,
            raw_error: None,
        });
        return Some(Retrieved {
            file_path,
            title: extraction.title,
        });
    }

    attempts.push(AttemptRecord {
        strategy_index,
        attempt_number,
        started_at,
        outcome: AttemptOutcome::RetryableFailure,
        raw_error: Some("engine reported success but produced no file".to_string()),
    });
    None
}

/// Terminal failure path: logs the attempt trail, removes partial
/// artifacts, and builds the classified failure.
fn fail(
    slot: &OutputSlot,
    attempts: &[AttemptRecord],
    kind: ErrorKind,
    detail: impl AsRef<str>,
) -> RetrievalOutcome {
    log_attempts(attempts);
    slot.cleanup();
    Err(RetrievalFailure::new(kind, detail))
}

fn log_attempts(attempts: &[AttemptRecord]) {
    for record in attempts {
        debug!(
            strategy_index = record.strategy_index,
            attempt = record.attempt_number,
            started_at = ?record.started_at,
            outcome = ?record.outcome,
            raw_error = record.raw_error.as_deref().unwrap_or(""),
            "attempt record"
        );
    }
}
