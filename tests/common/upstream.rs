use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;

use comicgrep::error::{ComicgrepError, Result};
use comicgrep::types::XkcdInfo;
use comicgrep::upstream::ComicSource;

/// Scripted comic source: a fixed archive, optional per-request delay, and
/// failure injection. Ids absent from the archive behave like upstream gaps
/// (HTTP 404).
pub struct StubSource {
    last_id: u32,
    comics: HashMap<u32, XkcdInfo>,
    broken_ids: HashSet<u32>,
    delay: Option<Duration>,
    fail_last_id: bool,
}

impl StubSource {
    pub fn new(last_id: u32) -> Self {
        Self {
            last_id,
            comics: HashMap::new(),
            broken_ids: HashSet::new(),
            delay: None,
            fail_last_id: false,
        }
    }

    /// Add a comic whose searchable text is its title.
    pub fn with_comic(mut self, id: u32, title: &str) -> Self {
        self.comics.insert(
            id,
            XkcdInfo {
                id,
                url: format!("https://comics.example/{id}.png"),
                title: title.to_string(),
                description: String::new(),
                safe_title: title.to_string(),
                transcript: String::new(),
            },
        );
        self
    }

    /// Make fetching this id fail with a non-404 upstream error.
    pub fn with_broken_id(mut self, id: u32) -> Self {
        self.broken_ids.insert(id);
        self
    }

    /// Delay every fetch, to hold updates open.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make `last_id` fail, to exercise discovery errors.
    pub fn with_broken_last_id(mut self) -> Self {
        self.fail_last_id = true;
        self
    }
}

#[async_trait]
impl ComicSource for StubSource {
    async fn last_id(&self) -> Result<u32> {
        if self.fail_last_id {
            return Err(ComicgrepError::Upstream("stub: last id unavailable".into()));
        }
        Ok(self.last_id)
    }

    async fn get(&self, id: u32) -> Result<XkcdInfo> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.broken_ids.contains(&id) {
            return Err(ComicgrepError::Upstream(format!("stub: comic {id} broken")));
        }
        self.comics
            .get(&id)
            .cloned()
            .ok_or(ComicgrepError::NotFound { id })
    }
}
