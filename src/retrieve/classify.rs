//! Error classification onto the closed retrieval taxonomy.
//!
//! The raw error surface from the extraction engine is free text; this
//! module maps it onto [`ErrorKind`] with a pure, table-driven substring
//! match. The table is the only thing that changes when a platform starts
//! phrasing a rejection differently - orchestrator logic never does.
//!
//! # Classification table
//!
//! | Pattern class | `ErrorKind` | Disposition |
//! |---|---|---|
//! | "unavailable", "removed", "no longer available" | `ContentUnavailable` | terminal |
//! | "private" | `ContentPrivate` | terminal |
//! | "age-restricted", "confirm your age" | `AgeRestricted` | terminal |
//! | timeout / connection reset / DNS failure | `TransientNetwork` | retry in place |
//! | no formats / empty result | `NoPlayableFormat` | escalate |
//! | anything else | `Unknown` | escalate |
//!
//! `TooLarge` and `Timeout` are never produced here: the size gate and the
//! orchestrator's wall clock assign them directly.

use std::fmt;

/// Closed taxonomy of terminal retrieval failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The platform reports the content as deleted or never published.
    ContentUnavailable,
    /// The content exists but is restricted to authorized viewers.
    ContentPrivate,
    /// The platform requires age verification the pipeline cannot provide.
    AgeRestricted,
    /// Extraction succeeded structurally but yielded no usable format.
    NoPlayableFormat,
    /// Network-level failure presumed transient.
    TransientNetwork,
    /// The artifact exceeds the transport's attachment ceiling.
    TooLarge,
    /// The request's total wall-clock budget expired.
    Timeout,
    /// Unclassified failure.
    Unknown,
}

/// What the orchestrator does with a classified failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Abort the whole pipeline: retrying cannot change a definitive
    /// platform-side rejection.
    Terminal,
    /// Retry the same strategy after a bounded delay.
    Retry,
    /// Skip the current strategy's remaining retries and fall back to the
    /// next, more permissive strategy.
    Escalate,
}

/// Substring patterns (lowercase) mapped to error kinds, checked in order.
///
/// Network patterns come first: "HTTP Error 503: Service Unavailable" must
/// classify transient, never as removed content via the bare "unavailable".
const CLASSIFICATION_TABLE: &[(&[&str], ErrorKind)] = &[
    (
        &[
            "timed out",
            "timeout",
            "connection reset",
            "connection refused",
            "connection aborted",
            "temporary failure in name resolution",
            "failed to resolve",
            "getaddrinfo",
            "name or service not known",
            "network is unreachable",
            "service unavailable",
            "http error 5",
        ],
        ErrorKind::TransientNetwork,
    ),
    (
        &[
            "no video formats",
            "no formats found",
            "requested format is not available",
            "empty media response",
            "no media found",
        ],
        ErrorKind::NoPlayableFormat,
    ),
    (
        &[
            "age-restricted",
            "age restricted",
            "confirm your age",
            "age verification",
        ],
        ErrorKind::AgeRestricted,
    ),
    (&["private"], ErrorKind::ContentPrivate),
    (
        &[
            "video unavailable",
            "content unavailable",
            "unavailable",
            "has been removed",
            "removed by the uploader",
            "no longer available",
            "does not exist",
            "404",
        ],
        ErrorKind::ContentUnavailable,
    ),
];

/// Upper bound on diagnostic detail carried to callers.
///
/// Raw engine errors can embed whole tracebacks; the end of the pipeline is
/// a user-facing message, so the detail is clipped.
pub const MAX_DETAIL_LEN: usize = 200;

impl ErrorKind {
    /// Returns how the orchestrator must react to this kind.
    #[must_use]
    pub fn disposition(self) -> Disposition {
        match self {
            Self::ContentUnavailable
            | Self::ContentPrivate
            | Self::AgeRestricted
            | Self::TooLarge
            | Self::Timeout => Disposition::Terminal,
            Self::TransientNetwork => Disposition::Retry,
            Self::NoPlayableFormat | Self::Unknown => Disposition::Escalate,
        }
    }

    /// True when retrying or falling back cannot change the outcome.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self.disposition() == Disposition::Terminal
    }

    /// Stable lowercase name for logs and reports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ContentUnavailable => "content_unavailable",
            Self::ContentPrivate => "content_private",
            Self::AgeRestricted => "age_restricted",
            Self::NoPlayableFormat => "no_playable_format",
            Self::TransientNetwork => "transient_network",
            Self::TooLarge => "too_large",
            Self::Timeout => "timeout",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a raw extraction error string.
///
/// Case-insensitive, first matching table row wins, anything unmatched
/// degrades to [`ErrorKind::Unknown`].
#[must_use]
pub fn classify(raw_error: &str) -> ErrorKind {
    let lowered = raw_error.to_lowercase();
    for (patterns, kind) in CLASSIFICATION_TABLE {
        if patterns.iter().any(|pattern| lowered.contains(pattern)) {
            return *kind;
        }
    }
    ErrorKind::Unknown
}

/// Clips a raw diagnostic to [`MAX_DETAIL_LEN`] on a character boundary.
#[must_use]
pub fn truncate_detail(raw: &str) -> String {
    if raw.len() <= MAX_DETAIL_LEN {
        return raw.to_string();
    }
    let mut cut = MAX_DETAIL_LEN;
    while !raw.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &raw[..cut])
}
