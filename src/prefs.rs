//! Durable per-user language preference store.
//!
//! Replaces what would otherwise be an ambient in-process map with explicit
//! get/set operations over a durable table. Each operation is a single
//! statement - no multi-step preference transaction ever spans a retrieval.
//! The pipeline itself never reads this; the caller-facing layer does, to
//! pick user-facing text for a classified outcome.

use thiserror::Error;
use tracing::instrument;

use crate::db::Database;

/// Language applied when a user has no stored preference.
pub const DEFAULT_LANGUAGE: &str = "uz";

/// Preference store errors.
#[derive(Debug, Error)]
pub enum PrefsError {
    /// A query against the preferences table failed.
    #[error("preference query failed: {0}")]
    Query(#[from] sqlx::Error),
}

/// Typed access to the `preferences` table.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    db: Database,
}

impl PreferenceStore {
    /// Creates a store over an already-migrated database.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns the user's language code, or [`DEFAULT_LANGUAGE`] when no
    /// row exists.
    ///
    /// # Errors
    ///
    /// Returns [`PrefsError::Query`] if the read fails.
    #[instrument(skip(self))]
    pub async fn get(&self, user_id: i64) -> Result<String, PrefsError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT language_code FROM preferences WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(self.db.pool())
                .await?;

        Ok(row.map_or_else(|| DEFAULT_LANGUAGE.to_string(), |(code,)| code))
    }

    /// Inserts or updates the user's language code atomically.
    ///
    /// # Errors
    ///
    /// Returns [`PrefsError::Query`] if the upsert fails.
    #[instrument(skip(self))]
    pub async fn set(&self, user_id: i64, language_code: &str) -> Result<(), PrefsError> {
        sqlx::query(
            "INSERT INTO preferences (user_id, language_code) VALUES (?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                 language_code = excluded.language_code,
                 updated_at = datetime('now')",
        )
        .bind(user_id)
        .bind(language_code)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }
}
