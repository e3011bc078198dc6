use std::sync::Mutex;

use log::debug;
use moka::{future::Cache, policy::EvictionPolicy};

/// Default number of block heights kept per subscriber
pub const DEFAULT_MAX_VERSIONS: u64 = 256;

/// Block-height keyed history of committed states.
///
/// Holds at most one state per height. Committing replaces the stored value
/// as a whole, so readers only ever see complete states. Commits are ordered
/// by call order, not by height: [`latest`](StateStore::latest) is whatever
/// was committed last, which is what the log poller builds on.
pub struct StateStore<S> {
    versions: Cache<u64, S>,
    latest: Mutex<Option<u64>>,
}

impl<S> StateStore<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(max_versions: u64) -> Self {
        // LRU always admits the newest height; TinyLFU could reject it
        let versions = Cache::builder()
            .max_capacity(max_versions.max(1))
            .eviction_policy(EvictionPolicy::lru())
            .build();

        Self {
            versions,
            latest: Mutex::new(None),
        }
    }

    /// State committed for exactly `block_number`, if any.
    pub async fn get_state(&self, block_number: u64) -> Option<S> {
        self.versions.get(&block_number).await
    }

    /// Commit `state` at `block_number`, replacing any previous version there.
    pub async fn set_state(&self, state: S, block_number: u64) {
        self.versions.insert(block_number, state).await;

        if let Ok(mut latest) = self.latest.lock() {
            *latest = Some(block_number);
        }

        debug!("Committed state at block {}", block_number);
    }

    /// Most recently committed height and its state, if still held.
    pub async fn latest(&self) -> Option<(u64, S)> {
        let block_number = (*self.latest.lock().ok()?)?;
        let state = self.versions.get(&block_number).await?;
        Some((block_number, state))
    }
}

impl<S> Default for StateStore<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_MAX_VERSIONS)
    }
}
