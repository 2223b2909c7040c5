use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tokio::sync::oneshot;
use tracing::Instrument;

use crate::error::ComicgrepError;
use crate::limiter::Verdict;
use crate::metrics::{HTTP_REQUESTS_TOTAL, SEARCH_SHED_TOTAL};
use crate::server::AppState;

/// Expected authorization scheme. The wire contract uses `Token`, not
/// `Bearer`.
const TOKEN_PREFIX: &str = "Token ";

/// Middleware guarding administrative endpoints.
///
/// Requires `Authorization: Token <jwt>`. Missing header, wrong scheme, or a
/// failed verification are all 401 with a plain-text reason; anything else
/// from the verifier is a 500.
pub async fn auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(header) = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return (StatusCode::UNAUTHORIZED, "Authorization header is required").into_response();
    };

    let Some(token) = header.strip_prefix(TOKEN_PREFIX) else {
        return (StatusCode::UNAUTHORIZED, "Invalid authorization format").into_response();
    };

    match state.verifier.verify(token) {
        Ok(()) => next.run(request).await,
        Err(ComicgrepError::Unauthorized) => {
            (StatusCode::UNAUTHORIZED, "Authorization is not passed").into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "token verification failed unexpectedly");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authorization has gone wrong",
            )
                .into_response()
        }
    }
}

/// Middleware shedding excess `/api/search` callers.
///
/// The downstream call runs as a task submitted to the concurrency limiter;
/// this handler blocks on a channel until the task hands the response back.
/// Rejected submissions answer 503 immediately.
pub async fn concurrency(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (done_tx, done_rx) = oneshot::channel();

    let verdict = state.search_limiter.submit(async move {
        let response = next.run(request).await;
        let _ = done_tx.send(response);
    });

    match verdict {
        Verdict::Rejected => {
            SEARCH_SHED_TOTAL.inc();
            (StatusCode::SERVICE_UNAVAILABLE, "service unavailable").into_response()
        }
        Verdict::Accepted => match done_rx.await {
            Ok(response) => response,
            Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        },
    }
}

/// Middleware pacing `/api/isearch` callers.
///
/// The rate limiter runs the task in place once a token is available, so the
/// handler blocks for the pacing delay implicitly.
pub async fn rate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (done_tx, done_rx) = oneshot::channel();

    state
        .isearch_limiter
        .submit(async move {
            let response = next.run(request).await;
            let _ = done_tx.send(response);
        })
        .await;

    match done_rx.await {
        Ok(response) => response,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

/// Middleware that increments `HTTP_REQUESTS_TOTAL` for every response and
/// logs request details via structured tracing.
///
/// Uses `MatchedPath` to normalize route patterns for metric labels.
pub async fn http_metrics(
    matched_path: Option<MatchedPath>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let path = matched_path
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let uri = request.uri().path().to_string();
    let start = Instant::now();
    let response = next.run(request).await;
    let status = response.status().as_u16();
    let latency_ms = start.elapsed().as_millis();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status.to_string()])
        .inc();
    tracing::info!(
        method = %method,
        path = %uri,
        status = status,
        latency_ms = latency_ms,
        "request"
    );
    response
}

/// Middleware that attaches a request ID to every request.
///
/// - Respects an incoming `x-request-id` header if present.
/// - Otherwise generates a UUID v4.
/// - Creates a tracing span so all downstream logs include the request ID.
/// - Returns the request ID in the response `x-request-id` header.
pub async fn request_id(request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(String::from)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let rid = id.clone();
    async move {
        let mut response = next.run(request).await;
        if let Ok(value) = rid.parse() {
            response.headers_mut().insert("x-request-id", value);
        }
        response
    }
    .instrument(tracing::info_span!("request", request_id = %id))
    .await
}
