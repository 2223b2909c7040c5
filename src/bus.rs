//! In-process publish/subscribe of the `corpus.updated` topic.
//!
//! The payload is informational; presence of any message triggers an index
//! rebuild, so lagged subscribers that coalesce notifications lose nothing.

use tokio::sync::broadcast;
use tracing::debug;

/// Topic name, kept for log correlation with external broker deployments.
pub const CORPUS_UPDATED: &str = "corpus.updated";

/// Broadcast bus carrying the single "corpus changed" topic.
pub struct CorpusBus {
    tx: broadcast::Sender<()>,
}

impl CorpusBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    /// Best-effort publish. Having no subscribers is not a failure.
    pub fn publish(&self) {
        match self.tx.send(()) {
            Ok(subscribers) => debug!(topic = CORPUS_UPDATED, subscribers, "event published"),
            Err(_) => debug!(topic = CORPUS_UPDATED, "event published with no subscribers"),
        }
    }

    /// Subscribe to change events. The receiver yields one unit per publish,
    /// or a lag error after falling more than the channel capacity behind.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }
}

impl Default for CorpusBus {
    fn default() -> Self {
        Self::new()
    }
}
