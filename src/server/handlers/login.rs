use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::error;

use crate::error::ComicgrepError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
}

/// Exchanges the administrator credentials for a bearer token. The response
/// body is the bare token string. Malformed JSON and credential mismatches
/// are both 401.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Response {
    let Ok(Json(creds)) = payload else {
        return (StatusCode::UNAUTHORIZED, "Invalid JSON").into_response();
    };

    if creds.name.is_empty() || creds.password.is_empty() {
        return (StatusCode::UNAUTHORIZED, "Name and password are required").into_response();
    }

    match state.loginer.login(&creds.name, &creds.password) {
        Ok(token) => (StatusCode::OK, token).into_response(),
        Err(ComicgrepError::Unauthorized) => {
            (StatusCode::UNAUTHORIZED, "wrong login or password").into_response()
        }
        Err(e) => {
            error!(error = %e, "login failed unexpectedly");
            (StatusCode::INTERNAL_SERVER_ERROR, "Unknown error").into_response()
        }
    }
}
