use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ComicgrepError;
use crate::server::AppState;

use super::ApiError;

#[derive(Debug, Deserialize)]
pub struct WordsParams {
    #[serde(default)]
    pub phrase: String,
}

#[derive(Debug, Serialize)]
pub struct WordsResponse {
    pub words: Vec<String>,
    pub total: usize,
}

/// Normalizes a phrase into its keyword set.
pub async fn words(
    State(state): State<AppState>,
    Query(params): Query<WordsParams>,
) -> Result<Json<WordsResponse>, ApiError> {
    if params.phrase.is_empty() {
        return Err(ApiError(ComicgrepError::BadArguments(
            "phrase is empty".into(),
        )));
    }

    let words = state.normalizer.norm(&params.phrase).await?;
    let total = words.len();
    Ok(Json(WordsResponse { words, total }))
}
