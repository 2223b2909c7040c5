//! The inverted-index engine: rebuilds an in-memory word → comic-ids map on
//! change events and answers the two ranked search modes.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, watch, RwLock};
use tracing::{info, warn};

use crate::bus::CorpusBus;
use crate::error::Result;
use crate::metrics;
use crate::ports::{Normalizer, Pinger, Searcher};
use crate::storage::ComicStore;
use crate::types::ComicSummary;

pub struct SearchService {
    store: Arc<dyn ComicStore>,
    words: Arc<dyn Normalizer>,
    /// word → ids of comics containing it. Grows monotonically: rebuilds
    /// union new postings in and never remove entries.
    index: RwLock<HashMap<String, HashSet<u32>>>,
}

impl SearchService {
    pub fn new(store: Arc<dyn ComicStore>, words: Arc<dyn Normalizer>) -> Self {
        Self {
            store,
            words,
            index: RwLock::new(HashMap::new()),
        }
    }

    /// Merge the persisted posting lists into the in-memory index.
    pub async fn update_index(&self) -> Result<()> {
        let postings = self.store.find_all_words().await?;

        let mut index = self.index.write().await;
        for entry in postings {
            index
                .entry(entry.word)
                .or_default()
                .extend(entry.comic_ids);
        }
        let words = index.len();
        drop(index);

        metrics::INDEX_REBUILDS_TOTAL.inc();
        metrics::INDEX_WORDS.set(words as i64);
        info!(words, "index rebuilt");
        Ok(())
    }
}

#[async_trait]
impl Searcher for SearchService {
    async fn search(&self, phrase: &str, limit: usize) -> Result<Vec<ComicSummary>> {
        let words = self.words.norm(phrase).await?;
        self.store.find(&words, limit).await
    }

    async fn search_index(&self, phrase: &str, limit: usize) -> Result<Vec<ComicSummary>> {
        let words = self.words.norm(phrase).await?;

        let mut matches: HashMap<u32, usize> = HashMap::new();
        {
            let index = self.index.read().await;
            for word in &words {
                if let Some(ids) = index.get(word) {
                    for id in ids {
                        *matches.entry(*id).or_insert(0) += 1;
                    }
                }
            }
        }

        if matches.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(u32, usize)> = matches.into_iter().collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(limit);

        // Hydration misses are tolerated: the comic may have been dropped
        // since the index last grew.
        let mut comics = Vec::with_capacity(scored.len());
        for (id, _) in scored {
            if let Ok(summary) = self.store.get_by_id(id).await {
                comics.push(summary);
            }
        }
        Ok(comics)
    }
}

#[async_trait]
impl Pinger for SearchService {
    async fn ping(&self) -> Result<()> {
        self.store.ids().await.map(|_| ())
    }
}

/// Background task: rebuild the index whenever the corpus changes.
///
/// Subscribes at startup and waits for the first event; there is no eager
/// rebuild, so queries before the first event see an empty index.
pub async fn index_listener(
    service: Arc<SearchService>,
    bus: Arc<CorpusBus>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut events = bus.subscribe();
    info!("index listener started");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                    if let Err(e) = service.update_index().await {
                        warn!(error = %e, "index rebuild failed");
                    }
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("index listener stopping: bus closed");
                    break;
                }
            },
            _ = shutdown.changed() => {
                info!("index listener shutting down");
                break;
            }
        }
    }
}
