use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::error::ComicgrepError;
use crate::server::AppState;
use crate::types::{UpdateStats, UpdateStatus};

use super::ApiError;

const UPDATE_ACCEPTED: &str = "Request accepted for processing";

/// Runs a corpus update to completion. A second caller while one is running
/// gets 202 with the same body.
pub async fn update(State(state): State<AppState>) -> Response {
    match state.updater.update().await {
        Ok(()) => (StatusCode::OK, UPDATE_ACCEPTED).into_response(),
        Err(ComicgrepError::AlreadyExists) => (StatusCode::ACCEPTED, UPDATE_ACCEPTED).into_response(),
        Err(e) => {
            error!(error = %e, "update failed");
            ApiError(e).into_response()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatsReply {
    pub words_total: u64,
    pub words_unique: u64,
    pub comics_fetched: u64,
    pub comics_total: u64,
}

impl From<UpdateStats> for StatsReply {
    fn from(stats: UpdateStats) -> Self {
        Self {
            words_total: stats.words_total,
            words_unique: stats.words_unique,
            comics_fetched: stats.comics_fetched,
            comics_total: stats.comics_total,
        }
    }
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsReply>, ApiError> {
    let stats = state.updater.stats().await?;
    Ok(Json(StatsReply::from(stats)))
}

#[derive(Debug, Serialize)]
pub struct StatusReply {
    pub status: UpdateStatus,
}

pub async fn status(State(state): State<AppState>) -> Json<StatusReply> {
    let status = state.updater.status().await;
    Json(StatusReply { status })
}

/// Deletes every persisted comic. The peer index is re-derived on the next
/// successful update via the change bus.
pub async fn drop(State(state): State<AppState>) -> Result<Response, ApiError> {
    state.updater.drop_all().await?;
    Ok((
        StatusCode::OK,
        "Command 'drop' has been successfully procceed",
    )
        .into_response())
}
