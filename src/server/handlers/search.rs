use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ComicgrepError;
use crate::metrics::SEARCHES_TOTAL;
use crate::server::AppState;
use crate::types::ComicSummary;

use super::ApiError;

const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub phrase: String,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub comics: Vec<ComicSummary>,
    pub total: usize,
}

fn validate(params: &SearchParams) -> Result<usize, ApiError> {
    if params.phrase.is_empty() {
        return Err(ApiError(ComicgrepError::BadArguments(
            "phrase should be not empty".into(),
        )));
    }
    match params.limit {
        None => Ok(DEFAULT_LIMIT),
        Some(limit) if limit > 0 => Ok(limit as usize),
        Some(_) => Err(ApiError(ComicgrepError::BadArguments(
            "limit should be a positive integer".into(),
        ))),
    }
}

/// DB-driven ranked search.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let limit = validate(&params)?;
    SEARCHES_TOTAL.with_label_values(&["db"]).inc();

    let comics = state.searcher.search(&params.phrase, limit).await?;
    let total = comics.len();
    Ok(Json(SearchResponse { comics, total }))
}

/// Index-driven ranked search.
pub async fn isearch(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let limit = validate(&params)?;
    SEARCHES_TOTAL.with_label_values(&["index"]).inc();

    let comics = state.searcher.search_index(&params.phrase, limit).await?;
    let total = comics.len();
    Ok(Json(SearchResponse { comics, total }))
}
