//! The ingest engine: discovers missing comics, fetches them, normalizes
//! their text, persists them, and broadcasts one change event per batch.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::bus::CorpusBus;
use crate::error::{ComicgrepError, Result};
use crate::metrics;
use crate::ports::{Normalizer, Pinger, Updater};
use crate::storage::ComicStore;
use crate::types::{Comic, UpdateStats, UpdateStatus, XkcdInfo};
use crate::upstream::ComicSource;

/// Upper bound on one normalization request; longer comic text is packed
/// into chunks below this size at word boundaries.
const MAX_CHUNK_BYTES: usize = 4 * 1024;

pub struct IngestService {
    store: Arc<dyn ComicStore>,
    upstream: Arc<dyn ComicSource>,
    words: Arc<dyn Normalizer>,
    bus: Arc<CorpusBus>,
    concurrency: usize,
    running: AtomicBool,
    update_lock: tokio::sync::Mutex<()>,
}

/// Clears the running flag when an update finishes, on every exit path.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl IngestService {
    pub fn new(
        store: Arc<dyn ComicStore>,
        upstream: Arc<dyn ComicSource>,
        words: Arc<dyn Normalizer>,
        bus: Arc<CorpusBus>,
        concurrency: usize,
    ) -> Result<Self> {
        if concurrency < 1 {
            return Err(ComicgrepError::Config(format!(
                "wrong ingest concurrency specified: {concurrency}"
            )));
        }
        Ok(Self {
            store,
            upstream,
            words,
            bus,
            concurrency,
            running: AtomicBool::new(false),
            update_lock: tokio::sync::Mutex::new(()),
        })
    }
}

#[async_trait]
impl Updater for IngestService {
    async fn update(&self) -> Result<()> {
        // Only one update at a time; contenders learn immediately.
        let Ok(_guard) = self.update_lock.try_lock() else {
            warn!("update requested while another is running");
            return Err(ComicgrepError::AlreadyExists);
        };

        self.running.store(true, Ordering::Release);
        let _running = RunningGuard(&self.running);
        let timer = metrics::UPDATE_DURATION.start_timer();

        info!("starting corpus update");
        let last_id = self.upstream.last_id().await.inspect_err(|e| {
            metrics::UPDATES_TOTAL.with_label_values(&["failure"]).inc();
            error!(error = %e, "discovery failed: last id");
        })?;
        let existing: HashSet<u32> = self
            .store
            .ids()
            .await
            .inspect_err(|e| {
                metrics::UPDATES_TOTAL.with_label_values(&["failure"]).inc();
                error!(error = %e, "discovery failed: existing ids");
            })?
            .into_iter()
            .collect();

        let missing: Vec<u32> = (1..=last_id).filter(|id| !existing.contains(id)).collect();
        let scheduled = missing.len();
        info!(last_id, existing = existing.len(), scheduled, "discovery complete");

        if scheduled > 0 {
            let (jobs_tx, jobs_rx) = mpsc::channel::<u32>(scheduled);
            let jobs_rx = Arc::new(tokio::sync::Mutex::new(jobs_rx));

            let mut workers = Vec::with_capacity(self.concurrency);
            for _ in 0..self.concurrency {
                let jobs_rx = Arc::clone(&jobs_rx);
                let store = Arc::clone(&self.store);
                let upstream = Arc::clone(&self.upstream);
                let words = Arc::clone(&self.words);
                workers.push(tokio::spawn(async move {
                    loop {
                        let job = { jobs_rx.lock().await.recv().await };
                        let Some(id) = job else { break };
                        match ingest_one(&*store, &*upstream, &*words, id).await {
                            Ok(()) => {
                                metrics::COMICS_INGESTED_TOTAL.inc();
                                info!(id, "comic added");
                            }
                            Err(e) => {
                                metrics::INGEST_SKIPPED_TOTAL.inc();
                                warn!(id, error = %e, "skipping comic");
                            }
                        }
                    }
                }));
            }

            for id in missing {
                // The channel holds the whole batch, so this cannot block.
                let _ = jobs_tx.send(id).await;
            }
            drop(jobs_tx);

            for worker in workers {
                let _ = worker.await;
            }

            // One event per batch, after the pool drains, regardless of
            // per-item outcomes.
            self.bus.publish();
        }

        timer.observe_duration();
        metrics::UPDATES_TOTAL.with_label_values(&["success"]).inc();
        info!(scheduled, "corpus update finished");
        Ok(())
    }

    async fn stats(&self) -> Result<UpdateStats> {
        let db = self.store.stats().await?;
        let comics_total = self.upstream.last_id().await?;
        Ok(UpdateStats {
            words_total: db.words_total,
            words_unique: db.words_unique,
            comics_fetched: db.comics_fetched,
            comics_total: comics_total as u64,
        })
    }

    async fn status(&self) -> UpdateStatus {
        if self.running.load(Ordering::Acquire) {
            UpdateStatus::Running
        } else {
            UpdateStatus::Idle
        }
    }

    async fn drop_all(&self) -> Result<()> {
        self.store.drop_all().await?;
        info!("corpus dropped");
        Ok(())
    }
}

#[async_trait]
impl Pinger for IngestService {
    async fn ping(&self) -> Result<()> {
        self.store.ids().await.map(|_| ())
    }
}

/// Fetch, normalize, and persist a single comic id.
async fn ingest_one(
    store: &dyn ComicStore,
    upstream: &dyn ComicSource,
    words: &dyn Normalizer,
    id: u32,
) -> Result<()> {
    // The upstream returns HTTP 404 for comic 404; synthesize it locally.
    let info = if id == 404 {
        XkcdInfo::placeholder_404()
    } else {
        upstream.get(id).await?
    };

    let text = format!(
        "{} {} {} {}",
        info.title, info.description, info.safe_title, info.transcript
    );

    let mut normalized = Vec::new();
    for chunk in pack_chunks(&text, MAX_CHUNK_BYTES) {
        normalized.extend(words.norm(&chunk).await?);
    }
    normalized.sort_unstable();
    normalized.dedup();

    store
        .add(Comic {
            id,
            url: info.url,
            words: normalized,
        })
        .await
}

/// Pack whitespace-separated words into chunks of at most `max_bytes`,
/// joining with single spaces. A single word longer than the limit becomes
/// its own chunk.
fn pack_chunks(text: &str, max_bytes: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + word.len() + 1 > max_bytes {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
