//! Bounded worker pool for retrieval hand-off.
//!
//! The caller-facing layer runs a cooperative event loop serving many users
//! at once; a retrieval blocks for seconds to minutes. The dispatcher hands
//! each request to its own task, with a semaphore bounding how many run at
//! once. Tasks share no mutable state and finish in whatever order they
//! finish - the caller awaits its own handle only.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::retrieve::{ErrorKind, Orchestrator, RetrievalFailure, RetrievalOutcome, RetrievalRequest};

/// Default number of concurrent retrieval workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Bounded pool of retrieval workers.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    permits: Arc<Semaphore>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl Dispatcher {
    /// Creates a pool with `workers` concurrent slots (minimum 1).
    #[must_use]
    pub fn new(workers: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Hands one request to a worker without blocking the caller.
    ///
    /// The returned handle resolves to the request's terminal outcome; the
    /// caller suspends only on awaiting it. Requests beyond the pool bound
    /// queue on the semaphore in arrival order.
    #[instrument(skip(self, orchestrator, request), fields(url = %request.canonical_url))]
    pub fn dispatch(
        &self,
        orchestrator: Arc<Orchestrator>,
        request: RetrievalRequest,
        max_wall_time: Duration,
    ) -> JoinHandle<RetrievalOutcome> {
        let permits = Arc::clone(&self.permits);
        tokio::spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                // Only possible if the semaphore is closed, which this
                // module never does; surface it as a classified failure
                // rather than panicking inside a worker.
                Err(_) => {
                    return Err(RetrievalFailure::new(
                        ErrorKind::Unknown,
                        "worker pool closed before the request could run",
                    ));
                }
            };
            orchestrator.retrieve(&request, max_wall_time).await
        })
    }
}
