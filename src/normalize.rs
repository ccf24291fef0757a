//! URL canonicalization for platform short/alias forms.
//!
//! Every inbound link passes through [`normalize`] exactly once before
//! platform classification or strategy selection. The function is pure and
//! total: anything it cannot confidently rewrite passes through unchanged,
//! since an un-normalized URL may still succeed under the generic strategy.
//!
//! # Rules
//!
//! Applied in priority order, first match wins:
//! 1. A `/shorts/<id>` path segment is rewritten to the host's canonical
//!    `/watch?v=<id>` form, with the identifier cut at the first `?` or `&`.
//! 2. Known short domains (`youtu.be/<id>`) expand to the long-domain watch
//!    URL, discarding the query string.
//! 3. Everything else passes through unchanged.
//!
//! # Idempotence
//!
//! `normalize(normalize(x)) == normalize(x)` holds for all inputs: both
//! rewrite rules produce `/watch?v=` URLs on hosts that no rule matches a
//! second time.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;
use url::Url;

/// Path segments that embed a video identifier in short-form URLs.
const ALIAS_SEGMENTS: &[&str] = &["shorts"];

/// Short domains and the canonical watch-URL prefix they expand to.
const SHORT_HOSTS: &[(&str, &str)] = &[("youtu.be", "https://www.youtube.com/watch?v=")];

/// Valid video identifiers: the charset platforms use for watch ids.
#[allow(clippy::expect_used)]
static ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+$").expect("id regex is valid") // Static pattern, safe to panic
});

/// Rewrites platform short/alias URL forms into canonical form.
///
/// Pure and total: on any parse failure or unrecognized shape the input is
/// returned unchanged (fail-open).
///
/// # Examples
///
/// ```
/// use clipfetch_core::normalize;
///
/// assert_eq!(
///     normalize("https://www.youtube.com/shorts/ABC123?feature=share"),
///     "https://www.youtube.com/watch?v=ABC123"
/// );
/// assert_eq!(
///     normalize("https://example.com/clip.mp4"),
///     "https://example.com/clip.mp4"
/// );
/// ```
#[must_use]
pub fn normalize(raw_url: &str) -> String {
    match try_normalize(raw_url) {
        Some(canonical) => {
            trace!(raw = %raw_url, canonical = %canonical, "URL rewritten");
            canonical
        }
        None => raw_url.to_string(),
    }
}

/// Attempts the rewrite rules; `None` means "pass through unchanged".
fn try_normalize(raw_url: &str) -> Option<String> {
    let parsed = Url::parse(raw_url).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?;

    // Rule 1: alias path segments ("/shorts/<id>") on any host
    if let Some(id) = alias_video_id(parsed.path()) {
        return Some(format!("{}://{host}/watch?v={id}", parsed.scheme()));
    }

    // Rule 2: short-domain expansion ("youtu.be/<id>")
    let host_lower = host.to_ascii_lowercase();
    for (short_host, watch_prefix) in SHORT_HOSTS {
        if host_lower == *short_host {
            let id = trailing_segment(parsed.path())?;
            return Some(format!("{watch_prefix}{id}"));
        }
    }

    None
}

/// Extracts the identifier following an alias segment, if present and valid.
fn alias_video_id(path: &str) -> Option<&str> {
    let mut segments = path.split('/').filter(|segment| !segment.is_empty());
    while let Some(segment) = segments.next() {
        if ALIAS_SEGMENTS.contains(&segment) {
            let candidate = clip_identifier(segments.next()?);
            return ID_PATTERN.is_match(candidate).then_some(candidate);
        }
    }
    None
}

/// Extracts the last path segment as an identifier, if valid.
fn trailing_segment(path: &str) -> Option<&str> {
    let candidate = clip_identifier(path.rsplit('/').find(|segment| !segment.is_empty())?);
    ID_PATTERN.is_match(candidate).then_some(candidate)
}

/// Cuts an identifier at the first `?` or `&`, the delimiters query strings
/// leak into raw path segments with.
fn clip_identifier(segment: &str) -> &str {
    match segment.find(['?', '&']) {
        Some(index) => &segment[..index],
        None => segment,
    }
}
