//! Route handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{Value, json};

use pageinsights_shared::Page;

use crate::AppState;
use crate::api_error::ApiError;

/// Page count returned by `/search` when no `limit` is given.
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub limit: Option<u32>,
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "status": "running",
        "msg": "PageInsights API. Try /page/{page_id} or /search?limit=10",
    }))
}

/// Cache-or-scrape. A miss always produces a record, possibly degraded.
pub async fn get_page(
    State(state): State<Arc<AppState>>,
    Path(page_id): Path<String>,
) -> Result<Json<Page>, ApiError> {
    let page = state.service.get_or_create(&page_id).await?;
    Ok(Json(page))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Page>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    let pages = state.service.list(limit).await?;
    Ok(Json(pages))
}
