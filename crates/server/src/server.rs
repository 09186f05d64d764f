//! Router assembly and serving

use crate::api::{self, AppState};
use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use http::HeaderValue;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/count", post(api::record_visit))
        .route("/count/{*page_path}", get(api::get_count))
        .route("/stats", get(api::get_stats))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// CORS layer for the configured origins; a `*` entry allows any
pub fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.iter().any(|origin| origin == "*") {
        return Ok(layer.allow_origin(Any));
    }

    let origins = allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|_| anyhow::anyhow!("Invalid CORS origin: {origin}"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}

/// Bind and serve until the process exits
pub async fn serve(router: Router, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("listening on http://{addr}");
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
