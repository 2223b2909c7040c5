use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

lazy_static::lazy_static! {
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "comicgrep_http_requests_total", "Total HTTP requests", &["method", "path", "status"]
    ).unwrap();
    pub static ref SEARCHES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "comicgrep_searches_total", "Search requests by mode", &["mode"]
    ).unwrap();
    pub static ref SEARCH_SHED_TOTAL: IntCounter = register_int_counter!(
        "comicgrep_search_shed_total", "Search requests rejected by the concurrency limiter"
    ).unwrap();
    pub static ref COMICS_INGESTED_TOTAL: IntCounter = register_int_counter!(
        "comicgrep_comics_ingested_total", "Comics persisted by the ingest engine"
    ).unwrap();
    pub static ref INGEST_SKIPPED_TOTAL: IntCounter = register_int_counter!(
        "comicgrep_ingest_skipped_total", "Comic ids skipped due to per-item failures"
    ).unwrap();
    pub static ref UPDATES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "comicgrep_updates_total", "Update runs", &["status"]
    ).unwrap();
    pub static ref UPDATE_DURATION: Histogram = register_histogram!(
        "comicgrep_update_duration_seconds", "Full update run duration",
        vec![0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0, 900.0]
    ).unwrap();
    pub static ref INDEX_REBUILDS_TOTAL: IntCounter = register_int_counter!(
        "comicgrep_index_rebuilds_total", "Inverted index rebuilds triggered by change events"
    ).unwrap();
    pub static ref INDEX_WORDS: IntGauge = register_int_gauge!(
        "comicgrep_index_words", "Distinct words in the in-memory inverted index"
    ).unwrap();
}

pub fn init() {
    lazy_static::initialize(&HTTP_REQUESTS_TOTAL);
    lazy_static::initialize(&SEARCHES_TOTAL);
    lazy_static::initialize(&SEARCH_SHED_TOTAL);
    lazy_static::initialize(&COMICS_INGESTED_TOTAL);
    lazy_static::initialize(&INGEST_SKIPPED_TOTAL);
    lazy_static::initialize(&UPDATES_TOTAL);
    lazy_static::initialize(&UPDATE_DURATION);
    lazy_static::initialize(&INDEX_REBUILDS_TOTAL);
    lazy_static::initialize(&INDEX_WORDS);
}
