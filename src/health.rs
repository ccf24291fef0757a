//! Liveness HTTP endpoint.
//!
//! Deployment platforms probe the service for liveness; the endpoint
//! answers `200` with a static body and knows nothing about the pipeline.

use axum::Router;
use axum::routing::get;
use tracing::info;

/// Static liveness response body.
pub const LIVENESS_BODY: &str = "clipfetch is alive";

/// Builds the liveness router: `GET /` -> 200 with [`LIVENESS_BODY`].
#[must_use]
pub fn router() -> Router {
    Router::new().route("/", get(|| async { LIVENESS_BODY }))
}

/// Serves the liveness router on `0.0.0.0:port` until the process exits.
///
/// # Errors
///
/// Returns the bind or serve error; callers typically log it and continue,
/// since liveness is advisory.
pub async fn serve(port: u16) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "liveness endpoint listening");
    axum::serve(listener, router()).await
}
