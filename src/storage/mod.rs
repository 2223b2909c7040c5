//! The persistence contract for the comic corpus.
//!
//! The trait mirrors a single SQL table `comics(id primary key, url text,
//! words text[])`; a database driver implements it out of tree. The
//! in-memory [`MemoryStore`] is the reference implementation used by the
//! composition root and the test suite.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Comic, ComicSummary, StoreStats, WordPostings};

#[async_trait]
pub trait ComicStore: Send + Sync {
    /// Insert or overwrite a comic by id.
    async fn add(&self, comic: Comic) -> Result<()>;

    /// All persisted ids, ascending.
    async fn ids(&self) -> Result<Vec<u32>>;

    /// Corpus-wide counters.
    async fn stats(&self) -> Result<StoreStats>;

    /// Delete every comic.
    async fn drop_all(&self) -> Result<()>;

    /// Ranked search over the word arrays. Ordering: comics containing every
    /// query word first, then by matched-word count descending, then by
    /// total word count ascending (shorter documents first).
    async fn find(&self, words: &[String], limit: usize) -> Result<Vec<ComicSummary>>;

    /// Posting lists for every word in the corpus, for index rebuilds.
    async fn find_all_words(&self) -> Result<Vec<WordPostings>>;

    /// Hydrate a single comic, `NotFound` when absent.
    async fn get_by_id(&self, id: u32) -> Result<ComicSummary>;
}
