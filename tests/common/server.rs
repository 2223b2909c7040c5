use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;

use comicgrep::auth::TokenAuthority;
use comicgrep::bus::CorpusBus;
use comicgrep::config::Config;
use comicgrep::index::{index_listener, SearchService};
use comicgrep::ingest::IngestService;
use comicgrep::limiter::{ConcurrencyLimiter, RateLimiter};
use comicgrep::normalize::WordsService;
use comicgrep::ports::Pinger;
use comicgrep::server::routes::build_router;
use comicgrep::server::AppState;
use comicgrep::storage::{ComicStore, MemoryStore};
use comicgrep::upstream::ComicSource;

use super::upstream::StubSource;

pub const TEST_ADMIN_USER: &str = "admin";
pub const TEST_ADMIN_PASSWORD: &str = "hunter2";

/// A running gateway bound to an ephemeral port, with its state exposed so
/// tests can reach the limiters and the store directly.
pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
    pub store: Arc<dyn ComicStore>,
    _shutdown: watch::Sender<bool>,
}

/// Config with test credentials and defaults suitable for fast tests.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.auth.admin_user = Some(TEST_ADMIN_USER.to_string());
    config.auth.admin_password = Some(TEST_ADMIN_PASSWORD.to_string());
    config.auth.token_secret = Some("integration-test-secret".to_string());
    config.auth.token_ttl_secs = 60;
    config.admission.search_rate = 50;
    config
}

pub async fn start_test_server(stub: StubSource) -> TestServer {
    start_test_server_with_config(stub, test_config()).await
}

/// Assemble the full composition by hand, mirroring `startup::build_app_with`
/// but keeping handles to the pieces tests poke at.
pub async fn start_test_server_with_config(stub: StubSource, config: Config) -> TestServer {
    comicgrep::metrics::init();

    let store: Arc<dyn ComicStore> = Arc::new(MemoryStore::new());
    let upstream: Arc<dyn ComicSource> = Arc::new(stub);
    let words = Arc::new(WordsService::new());
    let bus = Arc::new(CorpusBus::new());

    let authority = Arc::new(TokenAuthority::from_config(&config.auth).unwrap());
    let ingest = Arc::new(
        IngestService::new(
            Arc::clone(&store),
            upstream,
            words.clone(),
            Arc::clone(&bus),
            config.ingest.concurrency,
        )
        .unwrap(),
    );
    let search = Arc::new(SearchService::new(Arc::clone(&store), words.clone()));

    let search_limiter = Arc::new(ConcurrencyLimiter::new(config.admission.search_concurrency));
    search_limiter.start();
    let isearch_limiter = Arc::new(RateLimiter::new(config.admission.search_rate));
    isearch_limiter.start();

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

    let app = build_router(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{addr}"),
        state,
        store,
        _shutdown: shutdown_tx,
    }
}

/// Log in over HTTP and return the bearer token.
pub async fn login(client: &reqwest::Client, base_url: &str) -> String {
    let resp = client
        .post(format!("{base_url}/api/login"))
        .json(&serde_json::json!({
            "name": TEST_ADMIN_USER,
            "password": TEST_ADMIN_PASSWORD,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    resp.text().await.unwrap()
}

/// Poll isearch until it returns at least one hit or the deadline passes.
/// The index rebuild happens asynchronously after an update's change event.
pub async fn wait_for_index(client: &reqwest::Client, base_url: &str, phrase: &str) {
    for _ in 0..100 {
        let resp = client
            .get(format!("{base_url}/api/isearch"))
            .query(&[("phrase", phrase), ("limit", "1")])
            .send()
            .await
            .unwrap();
        if resp.status() == 200 {
            let body: serde_json::Value = resp.json().await.unwrap();
            if body["total"].as_u64().unwrap_or(0) > 0 {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("index never caught up for phrase '{phrase}'");
}
