use std::collections::{BTreeMap, BTreeSet, HashSet};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::{ComicgrepError, Result};
use crate::types::{Comic, ComicSummary, StoreStats, WordPostings};

use super::ComicStore;

/// In-memory implementation of the comics table.
#[derive(Debug, Default)]
pub struct MemoryStore {
    comics: DashMap<u32, Comic>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ComicStore for MemoryStore {
    async fn add(&self, comic: Comic) -> Result<()> {
        self.comics.insert(comic.id, comic);
        Ok(())
    }

    async fn ids(&self) -> Result<Vec<u32>> {
        let mut ids: Vec<u32> = self.comics.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn stats(&self) -> Result<StoreStats> {
        let mut words_total: u64 = 0;
        let mut unique: HashSet<String> = HashSet::new();
        for entry in self.comics.iter() {
            words_total += entry.words.len() as u64;
            unique.extend(entry.words.iter().cloned());
        }
        Ok(StoreStats {
            words_total,
            words_unique: unique.len() as u64,
            comics_fetched: self.comics.len() as u64,
        })
    }

    async fn drop_all(&self) -> Result<()> {
        self.comics.clear();
        Ok(())
    }

    async fn find(&self, words: &[String], limit: usize) -> Result<Vec<ComicSummary>> {
        let query: HashSet<&str> = words.iter().map(String::as_str).collect();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        struct Ranked {
            full_match: bool,
            matched: usize,
            word_count: usize,
            summary: ComicSummary,
        }

        let mut ranked: Vec<Ranked> = self
            .comics
            .iter()
            .filter_map(|entry| {
                let matched = entry
                    .words
                    .iter()
                    .filter(|w| query.contains(w.as_str()))
                    .count();
                if matched == 0 {
                    return None;
                }
                Some(Ranked {
                    full_match: matched == query.len(),
                    matched,
                    word_count: entry.words.len(),
                    summary: ComicSummary {
                        id: entry.id,
                        url: entry.url.clone(),
                    },
                })
            })
            .collect();

        // Full matches first, then most matched words, then shortest
        // document; id ascending keeps the order deterministic.
        ranked.sort_by(|a, b| {
            b.full_match
                .cmp(&a.full_match)
                .then(b.matched.cmp(&a.matched))
                .then(a.word_count.cmp(&b.word_count))
                .then(a.summary.id.cmp(&b.summary.id))
        });

        Ok(ranked
            .into_iter()
            .take(limit)
            .map(|r| r.summary)
            .collect())
    }

    async fn find_all_words(&self) -> Result<Vec<WordPostings>> {
        let mut postings: BTreeMap<String, BTreeSet<u32>> = BTreeMap::new();
        for entry in self.comics.iter() {
            for word in &entry.words {
                postings.entry(word.clone()).or_default().insert(entry.id);
            }
        }
        Ok(postings
            .into_iter()
            .map(|(word, ids)| WordPostings {
                word,
                comic_ids: ids.into_iter().collect(),
            })
            .collect())
    }

    async fn get_by_id(&self, id: u32) -> Result<ComicSummary> {
        self.comics
            .get(&id)
            .map(|entry| ComicSummary {
                id: entry.id,
                url: entry.url.clone(),
            })
            .ok_or(ComicgrepError::NotFound { id })
    }
}
