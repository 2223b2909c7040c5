/// HTTP request handlers for all API endpoints.
pub mod handlers;
/// Custom middleware (auth, admission control, request IDs, metrics).
pub mod middleware;
/// Axum router construction and route definitions.
pub mod routes;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::Config;
use crate::limiter::{ConcurrencyLimiter, RateLimiter};
use crate::ports::{Loginer, Normalizer, Pinger, Searcher, TokenVerifier, Updater};

/// Shared application state injected into all handlers via axum's State
/// extractor. Each handler pulls exactly one capability out of it.
#[derive(Clone)]
pub struct AppState {
    /// Phrase normalization backend.
    pub normalizer: Arc<dyn Normalizer>,
    /// Ingest engine backend.
    pub updater: Arc<dyn Updater>,
    /// Search backend (both modes).
    pub searcher: Arc<dyn Searcher>,
    /// Administrator credential exchange.
    pub loginer: Arc<dyn Loginer>,
    /// Bearer-token verification for protected endpoints.
    pub verifier: Arc<dyn TokenVerifier>,
    /// Named backends probed by the ping fan-out.
    pub pingers: Arc<BTreeMap<&'static str, Arc<dyn Pinger>>>,
    /// Sheds excess `/api/search` callers.
    pub search_limiter: Arc<ConcurrencyLimiter>,
    /// Paces `/api/isearch` callers.
    pub isearch_limiter: Arc<RateLimiter>,
    /// Global configuration.
    pub config: Arc<Config>,
}
