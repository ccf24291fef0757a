//! yt-dlp subprocess driver.
//!
//! Translates a [`StrategyConfig`] into a yt-dlp invocation: format
//! selector, headers, player-client hints, socket timeout, and the
//! strategy's literal feature switches. The child runs under a watchdog
//! bounded by the attempt cap and is killed on expiry; stderr is returned
//! verbatim as the raw error surface.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument};

use super::{ExtractError, Extraction, Extractor};
use crate::retrieve::OutputSlot;
use crate::strategy::StrategyConfig;

/// Binary resolved from `PATH` unless overridden.
pub const DEFAULT_YTDLP_BIN: &str = "yt-dlp";

/// Title used when the engine prints nothing usable for one.
const FALLBACK_TITLE: &str = "Media";

/// Extraction engine backed by the `yt-dlp` CLI.
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    binary: PathBuf,
}

impl Default for YtDlpExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl YtDlpExtractor {
    /// Creates an extractor using the `yt-dlp` binary from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_YTDLP_BIN),
        }
    }

    /// Creates an extractor using an explicit binary path.
    #[must_use]
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Assembles the yt-dlp invocation for one attempt.
    fn build_command(&self, url: &str, strategy: &StrategyConfig, slot: &OutputSlot) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--no-playlist")
            .arg("--no-progress")
            .arg("--no-warnings")
            .arg("--quiet")
            // --print implies --simulate; --no-simulate keeps the download.
            .arg("--no-simulate")
            .arg("--print")
            .arg("title")
            .arg("--print")
            .arg("after_move:filepath")
            .arg("--format")
            .arg(strategy.format_selector)
            .arg("--output")
            .arg(slot.template());

        // yt-dlp exposes a single socket timeout covering both connection
        // setup and fragment reads, so the effective flag is the larger of
        // the two budgets.
        let socket_timeout = strategy.timeouts.socket.max(strategy.timeouts.per_fragment);
        cmd.arg("--socket-timeout")
            .arg(socket_timeout.as_secs().to_string());

        for (name, value) in strategy.http_headers {
            cmd.arg("--add-header").arg(format!("{name}:{value}"));
        }

        if !strategy.client_variants.is_empty() {
            cmd.arg("--extractor-args").arg(format!(
                "youtube:player_client={}",
                strategy.client_variants.join(",")
            ));
        }

        for flag in strategy.feature_flags {
            cmd.arg(flag);
        }

        cmd.arg("--").arg(url);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    #[instrument(skip(self, strategy, slot), fields(strategy = strategy.name))]
    async fn extract(
        &self,
        url: &str,
        strategy: &StrategyConfig,
        slot: &OutputSlot,
        cap: Duration,
    ) -> Result<Extraction, ExtractError> {
        let mut cmd = self.build_command(url, strategy, slot);
        debug!(engine = %self.binary.display(), "spawning extraction engine");

        // kill_on_drop reaps the child when the timeout drops the future.
        let output = match tokio::time::timeout(cap, cmd.output()).await {
            Err(_) => return Err(ExtractError::AttemptTimeout { limit: cap }),
            Ok(Err(source)) => return Err(ExtractError::Launch { source }),
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let stderr = if stderr.is_empty() {
                format!("extraction engine exited with {}", output.status)
            } else {
                stderr
            };
            return Err(ExtractError::Failed { stderr });
        }

        Ok(parse_report(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Parses the engine's printed report: title on the first line, final file
/// path on the last.
///
/// A single printed line is taken as the path (some extractors print no
/// title), with [`FALLBACK_TITLE`] substituted.
fn parse_report(stdout: &str) -> Extraction {
    let lines: Vec<&str> = stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let (title, path) = match lines.as_slice() {
        [] => (FALLBACK_TITLE, ""),
        [only] => (FALLBACK_TITLE, *only),
        [first, .., last] => (*first, *last),
    };

    Extraction {
        file_path: PathBuf::from(path),
        title: title.to_string(),
    }
}
