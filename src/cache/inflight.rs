//! In-flight fetch registry
//!
//! Collapses concurrent misses for one key into a single upstream fetch.
//! The first miss leads; later misses subscribe to the leader's outcome.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::error::{CacheError, Result};

/// Serialized payload, or the error the leader's fetch ended with.
pub(crate) type Outcome = Result<String>;

pub(crate) const CANCELLED: &str = "in-flight fetch cancelled";

#[derive(Debug, Default)]
pub(crate) struct InflightFetches {
    pending: DashMap<String, broadcast::Sender<Outcome>>,
}

/// Role of a request in the fetch for its key.
pub(crate) enum Slot<'a> {
    Leader(LeaderGuard<'a>),
    Waiter(Waiter),
}

impl InflightFetches {
    pub fn join(&self, key: &str) -> Slot<'_> {
        match self.pending.entry(key.to_string()) {
            Entry::Occupied(entry) => Slot::Waiter(Waiter {
                receiver: entry.get().subscribe(),
            }),
            Entry::Vacant(entry) => {
                let (sender, _) = broadcast::channel(1);
                entry.insert(sender.clone());
                Slot::Leader(LeaderGuard {
                    registry: self,
                    key: key.to_string(),
                    sender: Some(sender),
                })
            }
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

/// Held by the leader for the duration of its fetch.
///
/// Dropping it without [`LeaderGuard::complete`] closes the channel, so every
/// waiter sees the fetch as cancelled.
pub(crate) struct LeaderGuard<'a> {
    registry: &'a InflightFetches,
    key: String,
    sender: Option<broadcast::Sender<Outcome>>,
}

impl LeaderGuard<'_> {
    /// Publishes the outcome to every waiter.
    pub fn complete(mut self, outcome: Outcome) {
        // Unregister first: a request arriving after this point starts afresh
        // and cannot subscribe to a channel that already fired.
        self.registry.pending.remove(&self.key);
        if let Some(sender) = self.sender.take() {
            // No receivers is fine
            let _ = sender.send(outcome);
        }
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if self.sender.is_some() {
            self.registry.pending.remove(&self.key);
        }
    }
}

pub(crate) struct Waiter {
    receiver: broadcast::Receiver<Outcome>,
}

impl Waiter {
    pub async fn outcome(mut self) -> Outcome {
        match self.receiver.recv().await {
            Ok(outcome) => outcome,
            Err(_) => Err(CacheError::UpstreamFetchFailed(CANCELLED.to_string())),
        }
    }
}
