//! Capability traits at the seams between the gateway and its backends.
//!
//! Each gateway handler depends on exactly one of these. The gRPC transport,
//! SQL driver, and broker client named in the deployment docs are external
//! collaborators; these traits plus [`crate::storage::ComicStore`],
//! [`crate::upstream::ComicSource`], and [`crate::bus::CorpusBus`] are their
//! interface contracts.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ComicSummary, UpdateStats, UpdateStatus};

/// Liveness probe for the ping fan-out.
#[async_trait]
pub trait Pinger: Send + Sync {
    async fn ping(&self) -> Result<()>;
}

/// Phrase normalization: split, stem, filter, deduplicate.
#[async_trait]
pub trait Normalizer: Send + Sync {
    async fn norm(&self, phrase: &str) -> Result<Vec<String>>;
}

/// The ingest engine's public surface.
#[async_trait]
pub trait Updater: Send + Sync {
    async fn update(&self) -> Result<()>;
    async fn stats(&self) -> Result<UpdateStats>;
    async fn status(&self) -> UpdateStatus;
    async fn drop_all(&self) -> Result<()>;
}

/// The two ranked search modes.
#[async_trait]
pub trait Searcher: Send + Sync {
    /// DB-driven search: ranking delegated to persistence.
    async fn search(&self, phrase: &str, limit: usize) -> Result<Vec<ComicSummary>>;
    /// Index-driven search over the in-memory inverted index.
    async fn search_index(&self, phrase: &str, limit: usize) -> Result<Vec<ComicSummary>>;
}

/// Credential exchange for the administrator.
pub trait Loginer: Send + Sync {
    fn login(&self, name: &str, password: &str) -> Result<String>;
}

/// Bearer-token verification for the auth middleware.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<()>;
}
