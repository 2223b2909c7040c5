//! Phrase normalization: non-alphanumeric split, English Snowball stemming,
//! stop-word removal, deduplication.

use std::collections::{BTreeSet, HashSet};

use async_trait::async_trait;
use rust_stemmers::{Algorithm, Stemmer};

use crate::error::{ComicgrepError, Result};
use crate::ports::{Normalizer, Pinger};

/// Hard cap on a single normalization request. Larger inputs must be
/// chunked by the caller.
pub const MAX_PHRASE_BYTES: usize = 4096;

/// Stems on this list are dropped from the output. The list is matched
/// against the stemmed form of each token.
static STOP_WORDS: &[&str] = &[
    "of", "the", "a", "and", "or", "will", "would", "i", "me", "you", "your", "he", "his", "him",
    "who", "it", "that", "she", "her", "we", "our", "they", "their", "them",
];

lazy_static::lazy_static! {
    static ref STOP_WORD_SET: HashSet<&'static str> = STOP_WORDS.iter().copied().collect();
}

/// Normalize a phrase into a sorted, duplicate-free set of stemmed keywords.
///
/// Steps:
/// 1. Lowercase (before splitting: case folding can emit combining marks,
///    which must land outside the tokens)
/// 2. Split on any run of non-alphanumeric Unicode code points
/// 3. Apply English Snowball stemming
/// 4. Drop stems on the stop-word list
/// 5. Deduplicate
#[must_use]
pub fn normalize(phrase: &str) -> Vec<String> {
    let stemmer = Stemmer::create(Algorithm::English);
    let folded = phrase.to_lowercase();
    let mut stems = BTreeSet::new();

    for token in folded.split(|c: char| !c.is_alphanumeric()) {
        if token.is_empty() {
            continue;
        }
        let stem = stemmer.stem(token).into_owned();
        if stem.is_empty() || STOP_WORD_SET.contains(stem.as_str()) {
            continue;
        }
        stems.insert(stem);
    }

    stems.into_iter().collect()
}

/// The normalizer backend: stateless, so it is always healthy.
#[derive(Debug, Default, Clone)]
pub struct WordsService;

impl WordsService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Normalizer for WordsService {
    async fn norm(&self, phrase: &str) -> Result<Vec<String>> {
        if phrase.len() > MAX_PHRASE_BYTES {
            return Err(ComicgrepError::TooLarge {
                limit: MAX_PHRASE_BYTES,
            });
        }
        Ok(normalize(phrase))
    }
}

#[async_trait]
impl Pinger for WordsService {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
