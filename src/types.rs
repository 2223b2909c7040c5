use serde::{Deserialize, Serialize};

/// One entry in the persisted corpus: a comic id, its image URL, and the
/// normalized keywords extracted from its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comic {
    pub id: u32,
    pub url: String,
    /// Normalized word set: lower-case stems, no whitespace, no punctuation.
    pub words: Vec<String>,
}

/// The projection of a comic returned by searches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComicSummary {
    #[serde(rename = "ID")]
    pub id: u32,
    #[serde(rename = "URL")]
    pub url: String,
}

/// Transport record from the upstream comic source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XkcdInfo {
    pub id: u32,
    pub url: String,
    pub title: String,
    pub description: String,
    pub safe_title: String,
    pub transcript: String,
}

impl XkcdInfo {
    /// The upstream returns HTTP 404 for comic 404, so the ingest engine
    /// synthesizes this placeholder instead of fetching it.
    pub fn placeholder_404() -> Self {
        Self {
            id: 404,
            url: String::new(),
            title: "404".to_string(),
            description: "Not found".to_string(),
            safe_title: "404".to_string(),
            transcript: "Not found".to_string(),
        }
    }
}

/// Posting list for a single word, as read back from persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordPostings {
    pub word: String,
    pub comic_ids: Vec<u32>,
}

/// Aggregates derived from persistence alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub words_total: u64,
    pub words_unique: u64,
    pub comics_fetched: u64,
}

/// Aggregates for the stats endpoint: persistence counters plus the
/// upstream's last known id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpdateStats {
    pub words_total: u64,
    pub words_unique: u64,
    pub comics_fetched: u64,
    pub comics_total: u64,
}

/// Whether an update is currently executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStatus {
    Idle,
    Running,
    /// Reserved for transports that cannot reach the backend.
    Unknown,
}

impl std::fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateStatus::Idle => write!(f, "idle"),
            UpdateStatus::Running => write!(f, "running"),
            UpdateStatus::Unknown => write!(f, "unknown"),
        }
    }
}
