use std::time::Duration;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::handlers::{login, metrics, ping, search, update, words};
use super::middleware;
use super::AppState;

/// Builds the axum router with all routes, middleware, and shared state.
///
/// Admission middleware is attached per endpoint: `/api/search` sheds
/// through the concurrency limiter, `/api/isearch` paces through the rate
/// limiter. The two administrative endpoints sit behind token auth and
/// outside the request timeout: an update runs for as long as the crawl
/// takes.
pub fn build_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.server.read_timeout_secs);

    let admin_routes = Router::new()
        .route("/api/db/update", post(update::update))
        .route("/api/db", delete(update::drop))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth,
        ));

    let timed_routes = Router::new()
        .route("/api/ping", get(ping::ping))
        .route("/api/words", get(words::words))
        .route("/api/login", post(login::login))
        .route("/api/db/stats", get(update::stats))
        .route("/api/db/status", get(update::status))
        .route(
            "/api/search",
            get(search::search).layer(axum::middleware::from_fn_with_state(
                state.clone(),
                middleware::concurrency,
            )),
        )
        .route(
            "/api/isearch",
            get(search::isearch).layer(axum::middleware::from_fn_with_state(
                state.clone(),
                middleware::rate,
            )),
        )
        .route("/metrics", get(metrics::metrics_handler))
        .layer(TimeoutLayer::new(timeout));

    admin_routes
        .merge(timed_routes)
        .layer(axum::middleware::from_fn(middleware::http_metrics))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(axum::middleware::from_fn(middleware::request_id))
        .with_state(state)
}
