//! HTTP routes of the stock query server.
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::Serialize;
use stock_common::net::{HEALTH_PATH, STOCKS_PATH};
use stock_common::page::RawQuery;
use stock_common::{ErrorBody, QueryParams, StockError};

use crate::model::feed::{FeedCache, FeedError};
use crate::model::query::query;

/// Message returned with `RATE_LIMIT`.
pub const RATE_LIMIT_MESSAGE: &str = "The upstream API request limit has been reached";
/// Message returned with `FETCH_ERROR`.
pub const FETCH_ERROR_MESSAGE: &str = "Failed to fetch data from the upstream server";

/// Shared state of the HTTP handlers.
pub struct AppState {
    /// Upstream snapshot cache.
    pub feed: FeedCache,
}

impl AppState {
    /// Creates the state around a feed cache.
    pub fn new(feed: FeedCache) -> Self {
        Self { feed }
    }
}

/// Creates the router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(STOCKS_PATH, get(list_stocks))
        .route(HEALTH_PATH, get(health))
        .with_state(state)
}

/// Paged stock list.
///
/// GET /api/stocks?offset=&limit=&sort=&order=&filter=
pub async fn list_stocks(
    State(state): State<Arc<AppState>>,
    Query(raw): Query<RawQuery>,
) -> Response {
    let params = QueryParams::from_query(&raw);
    stocks_page(&state, &params).await
}

async fn stocks_page(state: &AppState, params: &QueryParams) -> Response {
    let snapshot = match state.feed.snapshot().await {
        Ok(snapshot) => snapshot,
        Err(err) => return feed_error_response(err),
    };

    let page = query(&snapshot.rows, params, Utc::now());
    debug!(
        "offset={} limit={} sort={:?} order={} filter={:?} -> {} rows of {}",
        params.offset,
        params.limit,
        params.sort,
        params.order,
        params.filter,
        page.rows.len(),
        page.total
    );
    (StatusCode::OK, Json(page)).into_response()
}

fn feed_error_response(err: FeedError) -> Response {
    let (status, message) = match err {
        FeedError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_MESSAGE),
        FeedError::FetchFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, FETCH_ERROR_MESSAGE),
    };
    let err = StockError::from(err);
    warn!("Answering {} to stock query: {}", status, err);
    (status, Json(ErrorBody::new(err.error_code(), message))).into_response()
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests.
    pub status: &'static str,
    /// When the cached snapshot was fetched, if there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_at: Option<DateTime<Utc>>,
    /// Number of displayable rows in the cached snapshot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<usize>,
    /// Whether the next stock query will refresh the snapshot.
    pub stale: bool,
}

/// Health check handler. Never triggers an upstream fetch.
///
/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let info = state.feed.cached_info().await;
    Json(HealthResponse {
        status: "ok",
        cached_at: info.map(|(at, _)| at),
        records: info.map(|(_, n)| n),
        stale: state.feed.is_stale(Instant::now()).await,
    })
}
