//! Platform classification from canonical URLs.
//!
//! Classification is a pure function of the canonical URL: the same URL
//! always maps to the same platform, and therefore to the same strategy
//! ordering. The signature table is data, not branching logic, so adding a
//! platform is an additive change.

use std::fmt;

use url::Url;

/// Media platforms with dedicated extraction strategies.
///
/// Anything that matches no signature classifies as [`Platform::Generic`]
/// and retrieves through the single best-effort strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    YouTube,
    Instagram,
    TikTok,
    Facebook,
    Twitter,
    Generic,
}

/// Ordered platform signatures: host suffixes checked most-specific first.
const SIGNATURES: &[(&str, Platform)] = &[
    ("youtube.com", Platform::YouTube),
    ("youtu.be", Platform::YouTube),
    ("instagram.com", Platform::Instagram),
    ("tiktok.com", Platform::TikTok),
    ("facebook.com", Platform::Facebook),
    ("fb.watch", Platform::Facebook),
    ("twitter.com", Platform::Twitter),
    ("x.com", Platform::Twitter),
];

impl Platform {
    /// Classifies a canonical URL into a platform.
    ///
    /// Matches the URL host against the signature table, accepting the exact
    /// host or any subdomain of it (`m.youtube.com`, `vm.tiktok.com`).
    /// Unparseable URLs and unmatched hosts classify as `Generic`.
    #[must_use]
    pub fn detect(canonical_url: &str) -> Self {
        let Some(host) = Url::parse(canonical_url)
            .ok()
            .and_then(|parsed| parsed.host_str().map(str::to_ascii_lowercase))
        else {
            return Self::Generic;
        };

        for (signature, platform) in SIGNATURES {
            if host == *signature || host.ends_with(&format!(".{signature}")) {
                return *platform;
            }
        }
        Self::Generic
    }

    /// Returns the platform's lowercase name for logs and reports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::YouTube => "youtube",
            Self::Instagram => "instagram",
            Self::TikTok => "tiktok",
            Self::Facebook => "facebook",
            Self::Twitter => "twitter",
            Self::Generic => "generic",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
