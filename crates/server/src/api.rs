//! JSON API handlers
//!
//! Parse, validate, extract the client address, call the engine,
//! translate results to JSON. Endpoint shapes follow the counter API
//! contract: `/count` to record, `/count/{page}` and `/stats` to read.

use crate::error::AppError;
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tally_ledger::CounterEngine;

/// Shared handler state
pub struct AppState {
    pub engine: CounterEngine,
}

#[derive(Debug, Deserialize)]
pub struct CountRequest {
    #[serde(default)]
    pub site: String,
    #[serde(default)]
    pub page: String,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
    pub incremented: bool,
}

#[derive(Debug, Deserialize)]
pub struct SiteQuery {
    #[serde(default)]
    pub site: String,
}

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// `POST /count` — record a visit, debounced per client
pub async fn record_visit(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<CountRequest>,
) -> Result<Json<CountResponse>, AppError> {
    if body.site.is_empty() || body.page.is_empty() {
        return Err(AppError::BadRequest("missing site or page".to_string()));
    }

    let page = normalize_page_path(&body.page);
    let address = client_address(&headers, peer);
    let outcome = state.engine.record_visit(&body.site, &page, &address)?;

    Ok(Json(CountResponse {
        count: outcome.count,
        incremented: outcome.counted,
    }))
}

/// `GET /count/{*page_path}` — read a page's current count
pub async fn get_count(
    State(state): State<Arc<AppState>>,
    Path(page_path): Path<String>,
    Query(query): Query<SiteQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    if query.site.is_empty() {
        return Err(AppError::BadRequest("missing site parameter".to_string()));
    }

    let page = normalize_page_path(&page_path);
    let count = state.engine.get_count(&query.site, &page)?;
    Ok(Json(json!({ "count": count })))
}

/// `GET /stats` — aggregate statistics for one site
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SiteQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    if query.site.is_empty() {
        return Err(AppError::BadRequest("missing site parameter".to_string()));
    }

    let stats = state.engine.get_stats(&query.site)?;
    let top_pages: Vec<serde_json::Value> = stats
        .top_pages
        .iter()
        .map(|page| json!({ "page": page.page_path, "views": page.views }))
        .collect();

    Ok(Json(json!({
        "site": query.site,
        "total_pages": stats.total_pages,
        "total_views": stats.total_views,
        "top_pages": top_pages,
    })))
}

/// Pages are stored with a leading slash regardless of how the
/// transport spells them, so `POST {"page": "/intro"}` and
/// `GET /count/intro` agree on the same counter.
fn normalize_page_path(page: &str) -> String {
    if page.starts_with('/') {
        page.to_string()
    } else {
        format!("/{page}")
    }
}

/// Real client address: first `X-Forwarded-For` hop when present,
/// otherwise the socket peer.
fn client_address(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|hop| hop.trim().to_string())
        .filter(|hop| !hop.is_empty())
        .unwrap_or_else(|| peer.ip().to_string())
}
