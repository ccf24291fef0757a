//! Output naming, recovery, and cleanup for retrieved artifacts.
//!
//! The output directory is shared by every concurrent retrieval, so each
//! request gets an [`OutputSlot`]: the engine's `{id}.{ext}` naming plus a
//! request-scoped random nonce. Two retrievals of the *same* URL therefore
//! never collide on a path; the nonce is stripped (the name "promoted")
//! only after exclusive success.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use rand::Rng;
use rand::distributions::Alphanumeric;
use tracing::{debug, warn};

/// Length of the request-scoped nonce in output file names.
const NONCE_LEN: usize = 8;

/// Suffix the extraction engine gives half-written artifacts.
const PARTIAL_SUFFIX: &str = ".part";

/// A request-scoped naming slot inside the shared output directory.
#[derive(Debug, Clone)]
pub struct OutputSlot {
    dir: PathBuf,
    nonce: String,
}

impl OutputSlot {
    /// Creates a slot with a fresh random nonce.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LEN)
            .map(char::from)
            .collect();
        Self {
            dir: dir.into(),
            nonce,
        }
    }

    /// The shared output directory this slot writes into.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The request-scoped nonce embedded in every name this slot owns.
    #[must_use]
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// Output template handed to the extraction engine.
    ///
    /// Keeps the conventional `{id}.{ext}` scheme (`media_<id>.<ext>`) with
    /// the nonce spliced in before the extension.
    #[must_use]
    pub fn template(&self) -> String {
        self.dir
            .join(format!("media_%(id)s_{}.%(ext)s", self.nonce))
            .to_string_lossy()
            .into_owned()
    }

    /// True if `path` was written under this slot's nonce.
    #[must_use]
    pub fn owns(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| name.to_string_lossy().contains(&format!("_{}", self.nonce)))
            .unwrap_or(false)
    }

    /// Promotes a successful artifact to its canonical nonce-free name.
    ///
    /// Exclusive and best-effort: the link-then-unlink sequence cannot
    /// replace an existing file, so when a concurrent retrieval of the same
    /// content already claimed the canonical name, the unique name is kept -
    /// it is a valid terminal artifact name.
    #[must_use]
    pub fn promote(&self, path: &Path) -> PathBuf {
        let Some(file_name) = path.file_name().map(|name| name.to_string_lossy().into_owned())
        else {
            return path.to_path_buf();
        };
        let canonical_name = file_name.replacen(&format!("_{}", self.nonce), "", 1);
        if canonical_name == file_name {
            return path.to_path_buf();
        }
        let canonical = path.with_file_name(&canonical_name);
        match fs::hard_link(path, &canonical) {
            Ok(()) => {
                if let Err(error) = fs::remove_file(path) {
                    warn!(error = %error, path = %path.display(), "failed to drop unique name");
                }
                canonical
            }
            Err(error) if error.kind() == std::io::ErrorKind::AlreadyExists => {
                debug!(path = %canonical.display(), "canonical name taken, keeping unique name");
                path.to_path_buf()
            }
            Err(error) => {
                warn!(error = %error, path = %path.display(), "promotion failed");
                path.to_path_buf()
            }
        }
    }

    /// Best-effort recovery scan after a reported success with a missing
    /// expected path.
    ///
    /// Prefers a completed file written under this slot's nonce; falls back
    /// to the most-recently-created file in the output directory. Naming
    /// mismatches between what the engine reports and what it writes do
    /// occur, and losing a finished download over one is worse than an
    /// occasional wrong pick - which is why callers log this outcome as
    /// non-authoritative.
    #[must_use]
    pub fn recover(&self) -> Option<PathBuf> {
        let entries = fs::read_dir(&self.dir).ok()?;

        let mut owned: Option<(SystemTime, PathBuf)> = None;
        let mut newest: Option<(SystemTime, PathBuf)> = None;

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() || is_partial(&path) {
                continue;
            }
            let stamp = created_at(&path);
            if self.owns(&path) && owned.as_ref().is_none_or(|(best, _)| stamp > *best) {
                owned = Some((stamp, path.clone()));
            }
            if newest.as_ref().is_none_or(|(best, _)| stamp > *best) {
                newest = Some((stamp, path));
            }
        }

        owned.or(newest).map(|(_, path)| path)
    }

    /// Deletes every artifact (partials included) written under this slot.
    ///
    /// Called before any failure or timeout return so no partial file is
    /// left behind.
    pub fn cleanup(&self) {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() && self.owns(&path) {
                if let Err(error) = fs::remove_file(&path) {
                    warn!(error = %error, path = %path.display(), "failed to remove partial artifact");
                } else {
                    debug!(path = %path.display(), "removed leftover artifact");
                }
            }
        }
    }
}

fn is_partial(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().ends_with(PARTIAL_SUFFIX))
        .unwrap_or(false)
}

/// Creation timestamp, falling back to mtime on filesystems without
/// birth-time support.
fn created_at(path: &Path) -> SystemTime {
    fs::metadata(path)
        .and_then(|meta| meta.created().or_else(|_| meta.modified()))
        .unwrap_or(SystemTime::UNIX_EPOCH)
}
