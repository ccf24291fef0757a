//! Post-retrieval size gate.
//!
//! The transport this pipeline feeds has a hard attachment ceiling, so the
//! caller-facing layer runs every success through [`enforce_ceiling`]
//! before reporting it. An oversized artifact is deleted immediately and
//! the outcome becomes `Failure { TooLarge }` - no transcoding, no
//! truncation.

use std::fs;

use tracing::{info, warn};

use super::{ErrorKind, RetrievalFailure, RetrievalOutcome, Retrieved};

/// Default attachment ceiling: 50 MB.
pub const DEFAULT_SIZE_CEILING: u64 = 50 * 1024 * 1024;

/// Converts an oversized success into `Failure { TooLarge }`, deleting the
/// artifact.
#[must_use]
pub fn enforce_ceiling(retrieved: Retrieved, ceiling_bytes: u64) -> RetrievalOutcome {
    let size = match fs::metadata(&retrieved.file_path) {
        Ok(metadata) => metadata.len(),
        Err(error) => {
            return Err(RetrievalFailure::new(
                ErrorKind::Unknown,
                format!(
                    "retrieved file vanished before size check ({}): {error}",
                    retrieved.file_path.display()
                ),
            ));
        }
    };

    if size > ceiling_bytes {
        info!(
            file = %retrieved.file_path.display(),
            size,
            ceiling_bytes,
            "artifact over ceiling, deleting"
        );
        if let Err(error) = fs::remove_file(&retrieved.file_path) {
            warn!(
                error = %error,
                file = %retrieved.file_path.display(),
                "failed to delete oversized artifact"
            );
        }
        return Err(RetrievalFailure::new(
            ErrorKind::TooLarge,
            format!("file is {size} bytes, ceiling is {ceiling_bytes}"),
        ));
    }

    Ok(retrieved)
}
