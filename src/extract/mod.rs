//! Extraction engine seam.
//!
//! The pipeline treats media extraction as an opaque capability: given a
//! URL, a strategy configuration, and an output slot, one attempt either
//! produces a file plus title or fails with a raw error surface for the
//! classifier. The [`Extractor`] trait is that seam; [`YtDlpExtractor`] is
//! the production implementation, and tests substitute scripted stubs.

mod ytdlp;

pub use ytdlp::YtDlpExtractor;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::retrieve::OutputSlot;
use crate::strategy::StrategyConfig;

/// One successful extraction attempt's result.
///
/// `file_path` is the path the engine *reports*; the orchestrator verifies
/// it exists before trusting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Reported location of the retrieved artifact.
    pub file_path: PathBuf,
    /// Media title as the platform publishes it.
    pub title: String,
}

/// Failure of one extraction attempt.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The engine process could not be started at all.
    #[error("failed to launch extraction engine: {source}")]
    Launch {
        /// The underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// The engine ran and reported failure; `stderr` is the raw error
    /// surface the classifier maps onto the error taxonomy.
    #[error("{stderr}")]
    Failed {
        /// Raw engine diagnostics.
        stderr: String,
    },

    /// The attempt exceeded its time budget and the engine was killed.
    #[error("extraction attempt exceeded {limit:?}")]
    AttemptTimeout {
        /// The budget that expired.
        limit: Duration,
    },
}

/// Trait all extraction engines implement.
///
/// # Object Safety
///
/// This trait uses `async_trait` to support dynamic dispatch via
/// `Arc<dyn Extractor>`. Rust 2024 native async traits are not object-safe,
/// so `async_trait` is required for the orchestrator seam.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Returns the engine's name (e.g., "yt-dlp").
    fn name(&self) -> &str;

    /// Performs one extraction attempt.
    ///
    /// The attempt must finish within `cap` (the request's remaining
    /// wall-clock budget); implementations kill any in-flight work on
    /// expiry and leave partial artifacts only under `slot`'s nonce so the
    /// orchestrator can clean them up.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] when the attempt fails or times out.
    async fn extract(
        &self,
        url: &str,
        strategy: &StrategyConfig,
        slot: &OutputSlot,
        cap: Duration,
    ) -> Result<Extraction, ExtractError>;
}
