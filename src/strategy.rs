//! Static per-platform extraction strategy catalog.
//!
//! Each platform maps to an ordered list of [`StrategyConfig`]s, from "best
//! success odds, most targeted headers/client hints" down to "most
//! permissive, generic". The orchestrator walks the list in order, so the
//! ordering here IS the escalation policy. The catalog is static data read
//! at run time; adding a platform or a fallback tier is a data change only.

use std::time::Duration;

use crate::platform::Platform;

/// Browser user agent presented to platforms that gate formats on it.
const DESKTOP_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Socket/fragment timeout budgets for one extraction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Budget for establishing connections and metadata round-trips.
    pub socket: Duration,
    /// Budget for each media fragment read.
    pub per_fragment: Duration,
}

/// One extraction attempt's full configuration.
///
/// Read-only at run time; constructed only in the static tables below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyConfig {
    /// Stable name used in logs and attempt records.
    pub name: &'static str,
    /// Format selector handed to the extraction engine.
    pub format_selector: &'static str,
    /// HTTP headers the engine presents to the platform.
    pub http_headers: &'static [(&'static str, &'static str)],
    /// Ordered player-client variants to impersonate (platform-specific).
    pub client_variants: &'static [&'static str],
    /// Network timeout budgets for this attempt.
    pub timeouts: Timeouts,
    /// In-place retries allowed before escalating to the next strategy.
    pub retry_budget: u32,
    /// Literal extra engine switches (most permissive tiers loosen checks).
    pub feature_flags: &'static [&'static str],
}

const DEFAULT_TIMEOUTS: Timeouts = Timeouts {
    socket: Duration::from_secs(15),
    per_fragment: Duration::from_secs(20),
};

/// YouTube: targeted android/web clients first, then the web-safari pairing
/// that survives player API shape changes, then an unconstrained last resort.
const YOUTUBE: &[StrategyConfig] = &[
    StrategyConfig {
        name: "youtube-android-client",
        format_selector: "best[ext=mp4]/best",
        http_headers: &[("User-Agent", DESKTOP_UA)],
        client_variants: &["android", "web"],
        timeouts: DEFAULT_TIMEOUTS,
        retry_budget: 2,
        feature_flags: &[],
    },
    StrategyConfig {
        name: "youtube-web-safari",
        format_selector: "best[ext=mp4]/best",
        http_headers: &[("User-Agent", DESKTOP_UA)],
        client_variants: &["web", "web_safari"],
        timeouts: DEFAULT_TIMEOUTS,
        retry_budget: 2,
        feature_flags: &["--no-check-certificate"],
    },
    StrategyConfig {
        name: "youtube-permissive",
        format_selector: "best",
        http_headers: &[],
        client_variants: &[],
        timeouts: Timeouts {
            socket: Duration::from_secs(30),
            per_fragment: Duration::from_secs(30),
        },
        retry_budget: 1,
        feature_flags: &["--no-check-certificate"],
    },
];

/// Instagram serves different format sets to browser and bare clients;
/// the browser-UA tier first, then unconstrained.
const INSTAGRAM: &[StrategyConfig] = &[
    StrategyConfig {
        name: "instagram-browser",
        format_selector: "best[ext=mp4]/best",
        http_headers: &[("User-Agent", DESKTOP_UA)],
        client_variants: &[],
        timeouts: DEFAULT_TIMEOUTS,
        retry_budget: 2,
        feature_flags: &[],
    },
    StrategyConfig {
        name: "instagram-permissive",
        format_selector: "best",
        http_headers: &[],
        client_variants: &[],
        timeouts: DEFAULT_TIMEOUTS,
        retry_budget: 1,
        feature_flags: &["--no-check-certificate"],
    },
];

const TIKTOK: &[StrategyConfig] = &[
    StrategyConfig {
        name: "tiktok-browser",
        format_selector: "best[ext=mp4]/best",
        http_headers: &[("User-Agent", DESKTOP_UA)],
        client_variants: &[],
        timeouts: DEFAULT_TIMEOUTS,
        retry_budget: 2,
        feature_flags: &[],
    },
    StrategyConfig {
        name: "tiktok-permissive",
        format_selector: "best",
        http_headers: &[],
        client_variants: &[],
        timeouts: DEFAULT_TIMEOUTS,
        retry_budget: 1,
        feature_flags: &["--no-check-certificate"],
    },
];

const FACEBOOK: &[StrategyConfig] = &[
    StrategyConfig {
        name: "facebook-browser",
        format_selector: "best[ext=mp4]/best",
        http_headers: &[("User-Agent", DESKTOP_UA)],
        client_variants: &[],
        timeouts: DEFAULT_TIMEOUTS,
        retry_budget: 2,
        feature_flags: &[],
    },
    StrategyConfig {
        name: "facebook-permissive",
        format_selector: "best",
        http_headers: &[],
        client_variants: &[],
        timeouts: DEFAULT_TIMEOUTS,
        retry_budget: 1,
        feature_flags: &["--no-check-certificate"],
    },
];

const TWITTER: &[StrategyConfig] = &[
    StrategyConfig {
        name: "twitter-browser",
        format_selector: "best[ext=mp4]/best",
        http_headers: &[("User-Agent", DESKTOP_UA)],
        client_variants: &[],
        timeouts: DEFAULT_TIMEOUTS,
        retry_budget: 2,
        feature_flags: &[],
    },
    StrategyConfig {
        name: "twitter-permissive",
        format_selector: "best",
        http_headers: &[],
        client_variants: &[],
        timeouts: DEFAULT_TIMEOUTS,
        retry_budget: 1,
        feature_flags: &[],
    },
];

/// Single best-effort configuration for unrecognized platforms.
const GENERIC: &[StrategyConfig] = &[StrategyConfig {
    name: "generic-best",
    format_selector: "best",
    http_headers: &[],
    client_variants: &[],
    timeouts: DEFAULT_TIMEOUTS,
    retry_budget: 2,
    feature_flags: &[],
}];

impl Platform {
    /// Returns this platform's ordered strategy list.
    #[must_use]
    pub fn strategies(self) -> &'static [StrategyConfig] {
        match self {
            Self::YouTube => YOUTUBE,
            Self::Instagram => INSTAGRAM,
            Self::TikTok => TIKTOK,
            Self::Facebook => FACEBOOK,
            Self::Twitter => TWITTER,
            Self::Generic => GENERIC,
        }
    }
}

/// Returns the ordered strategy list for a canonical URL.
///
/// Same canonical URL, same platform, same strategy ordering - classification
/// is stable across calls.
#[must_use]
pub fn strategies_for(canonical_url: &str) -> &'static [StrategyConfig] {
    Platform::detect(canonical_url).strategies()
}
