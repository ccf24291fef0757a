//! Environment-derived service configuration.
//!
//! The deployment environment provides the chat-transport credential, the
//! administrator's user id, and the liveness listen port; everything has a
//! sane default so local CLI runs need no environment at all. Malformed
//! values log a warning and fall back to the default rather than aborting.

use std::env;
use std::path::PathBuf;

use tracing::warn;

use crate::retrieve::DEFAULT_SIZE_CEILING;

/// Default liveness listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default output directory for retrieved artifacts.
pub const DEFAULT_OUTPUT_DIR: &str = "downloads";

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Chat-transport credential (`BOT_TOKEN`). Consumed by the transport
    /// layer, not by the pipeline; absent in pure CLI runs.
    pub bot_token: Option<String>,
    /// Administrator user id (`ADMIN_ID`).
    pub admin_id: Option<i64>,
    /// Liveness endpoint listen port (`PORT`).
    pub port: u16,
    /// Output directory for retrieved artifacts (`OUTPUT_DIR`).
    pub output_dir: PathBuf,
    /// Attachment size ceiling in bytes (`SIZE_CEILING_BYTES`).
    pub size_ceiling: u64,
}

impl Config {
    /// Reads configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            bot_token: env::var("BOT_TOKEN").ok().filter(|token| !token.is_empty()),
            admin_id: parse_var("ADMIN_ID"),
            port: parse_var("PORT").unwrap_or(DEFAULT_PORT),
            output_dir: env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            size_ceiling: parse_var("SIZE_CEILING_BYTES").unwrap_or(DEFAULT_SIZE_CEILING),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot_token: None,
            admin_id: None,
            port: DEFAULT_PORT,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            size_ceiling: DEFAULT_SIZE_CEILING,
        }
    }
}

/// Parses an environment variable, warning (not failing) on bad values.
fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let value = env::var(name).ok()?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(var = name, value = %value, "ignoring unparseable environment value");
            None
        }
    }
}
