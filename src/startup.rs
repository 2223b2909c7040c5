//! Application startup and bootstrap logic.
//!
//! Extracted from `main.rs` so that the full composition — including an
//! injected store and upstream — can be built inside tests.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use crate::auth::TokenAuthority;
use crate::bus::CorpusBus;
use crate::config::Config;
use crate::error::Result;
use crate::index::{index_listener, SearchService};
use crate::ingest::IngestService;
use crate::limiter::{ConcurrencyLimiter, RateLimiter};
use crate::normalize::WordsService;
use crate::ports::Pinger;
use crate::server::routes::build_router;
use crate::server::AppState;
use crate::storage::{ComicStore, MemoryStore};
use crate::upstream::{ComicSource, XkcdClient};

/// Resolve the configuration file path.
///
/// Priority:
/// 1. `COMICGREP_CONFIG` environment variable
/// 2. `./comicgrep.toml` if it exists
/// 3. None (use defaults)
pub fn resolve_config_path() -> Option<String> {
    std::env::var("COMICGREP_CONFIG").ok().or_else(|| {
        let default = "comicgrep.toml";
        std::path::Path::new(default)
            .exists()
            .then(|| default.to_string())
    })
}

/// Initialize tracing subscriber from logging config.
///
/// Supports JSON and plain text formats. Uses `RUST_LOG` env var if set,
/// otherwise falls back to `config.logging.level`.
pub fn init_logging(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .init();
        }
        _ => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}

/// Build the application router against the default backends: the in-memory
/// store and the HTTP comic source from config.
pub async fn build_app(config: Config) -> Result<(Router, watch::Sender<bool>)> {
    let upstream = Arc::new(XkcdClient::new(
        &config.upstream.base_url,
        Duration::from_secs(config.upstream.timeout_secs),
    )?);
    build_app_with(config, Arc::new(MemoryStore::new()), upstream)
}

/// Build the application router with injected persistence and upstream.
///
/// This function:
/// - Initializes metrics
/// - Wires the words, ingest, and search backends over the shared bus
/// - Starts both admission limiters
/// - Spawns the index listener under a shutdown watch channel
/// - Builds `AppState` and the axum `Router`
pub fn build_app_with(
    config: Config,
    store: Arc<dyn ComicStore>,
    upstream: Arc<dyn ComicSource>,
) -> Result<(Router, watch::Sender<bool>)> {
    tracing::info!("comicgrep starting");
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        upstream = %config.upstream.base_url,
        ingest_concurrency = config.ingest.concurrency,
        search_concurrency = config.admission.search_concurrency,
        search_rate = config.admission.search_rate,
        "configuration loaded"
    );

    crate::metrics::init();

    let words = Arc::new(WordsService::new());
    let bus = Arc::new(CorpusBus::new());

    // Missing admin credentials or signing secret abort the boot.
    let authority = Arc::new(TokenAuthority::from_config(&config.auth)?);

    let ingest = Arc::new(IngestService::new(
        Arc::clone(&store),
        upstream,
        words.clone(),
        Arc::clone(&bus),
        config.ingest.concurrency,
    )?);
    let search = Arc::new(SearchService::new(Arc::clone(&store), words.clone()));

    let search_limiter = Arc::new(ConcurrencyLimiter::new(config.admission.search_concurrency));
    search_limiter.start();
    let isearch_limiter = Arc::new(RateLimiter::new(config.admission.search_rate));
    isearch_limiter.start();

    // The listener owns the only subscription; the index stays empty until
    // the first corpus.updated event.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(index_listener(
        Arc::clone(&search),
        Arc::clone(&bus),
        shutdown_rx,
    ));

    let mut pingers: BTreeMap<&'static str, Arc<dyn Pinger>> = BTreeMap::new();
    pingers.insert("words", words.clone());
    pingers.insert("update", ingest.clone());
    pingers.insert("search", search.clone());

    let state = AppState {
        normalizer: words,
        updater: ingest,
        searcher: search,
        loginer: authority.clone(),
        verifier: authority,
        pingers: Arc::new(pingers),
        search_limiter,
        isearch_limiter,
        config: Arc::new(config),
    };

    Ok((build_router(state), shutdown_tx))
}
