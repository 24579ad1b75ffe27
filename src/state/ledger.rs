// Access ledger.
// Durable record of when the user last opened or copied each repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::cache::KeyValueStore;
use crate::error::Result;
use crate::ranking::AccessTimes;

/// Store key holding the serialized access times.
pub const ACCESS_TIMES_KEY: &str = "repository-access-times";

/// Map of repository id to last access time, persisted as one JSON object.
///
/// Entries are only ever added or updated. Every write persists the whole map.
pub struct AccessLedger<S> {
    store: Arc<S>,
    // Serializes read-modify-write cycles within the process.
    write_lock: Mutex<()>,
}

impl<S: KeyValueStore> AccessLedger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// All recorded access times.
    ///
    /// An unreadable store or malformed payload yields an empty map rather than an
    /// error, so a corrupt ledger never blocks ranking.
    pub async fn get_all(&self) -> AccessTimes {
        match self.store.get(ACCESS_TIMES_KEY).await {
            Ok(Some(raw)) => parse(&raw).unwrap_or_default(),
            Ok(None) => AccessTimes::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read access ledger, treating as empty");
                AccessTimes::new()
            }
        }
    }

    /// Record that `id` was accessed at `now`.
    ///
    /// A malformed payload is replaced. A failure to read the store aborts the
    /// write, so data that might be readable later is never overwritten.
    pub async fn record_access(&self, id: &str, now: DateTime<Utc>) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut times = match self.store.get(ACCESS_TIMES_KEY).await? {
            Some(raw) => parse(&raw).unwrap_or_default(),
            None => AccessTimes::new(),
        };
        times.insert(id.to_string(), now);

        let json = serde_json::to_string(&times)?;
        self.store.set(ACCESS_TIMES_KEY, &json).await?;

        tracing::debug!(id, entries = times.len(), "Recorded repository access");
        Ok(())
    }
}

fn parse(raw: &str) -> Option<AccessTimes> {
    match serde_json::from_str(raw) {
        Ok(times) => Some(times),
        Err(e) => {
            tracing::warn!(error = %e, "Discarding malformed access ledger");
            None
        }
    }
}
