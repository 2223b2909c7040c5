//! The upstream comic source contract and its HTTP implementation.

pub mod xkcd;

pub use xkcd::XkcdClient;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::XkcdInfo;

#[async_trait]
pub trait ComicSource: Send + Sync {
    /// The id of the most recently published comic.
    async fn last_id(&self) -> Result<u32>;

    /// Fetch one comic's metadata. `NotFound` marks a gap in the archive.
    async fn get(&self, id: u32) -> Result<XkcdInfo>;
}
