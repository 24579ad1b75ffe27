// Repository list cache.
// Keeps the last fetched repository set with its fetch time and answers freshness checks.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::Repository;

use super::store::KeyValueStore;

/// Default freshness window for the repository list: 5 minutes.
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(5 * 60);

/// The last successfully fetched repository set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub repositories: Vec<Repository>,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    /// True iff less than `window` has elapsed since the fetch.
    pub fn is_fresh(&self, now: DateTime<Utc>, window: Duration) -> bool {
        let window = TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX);
        now.signed_duration_since(self.fetched_at) < window
    }
}

/// Cache for one repository listing, stored under a single key.
pub struct RepositoryCache<S> {
    store: Arc<S>,
    key: String,
}

impl<S: KeyValueStore> RepositoryCache<S> {
    pub fn new(store: Arc<S>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the cached entry. Unreadable or malformed entries count as absent.
    pub async fn read(&self) -> Option<CacheEntry> {
        let raw = match self.store.get(&self.key).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Failed to read repository cache");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Discarding malformed repository cache");
                None
            }
        }
    }

    /// Replace the cached entry with `repositories`, fetched at `now`.
    pub async fn write(&self, repositories: &[Repository], now: DateTime<Utc>) -> Result<()> {
        let entry = CacheEntry {
            repositories: repositories.to_vec(),
            fetched_at: now,
        };
        let json = serde_json::to_string(&entry)?;
        self.store.set(&self.key, &json).await?;
        tracing::debug!(key = %self.key, count = repositories.len(), "Wrote repository cache");
        Ok(())
    }

    /// True iff an entry exists and is younger than `window`.
    pub async fn is_fresh(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.read()
            .await
            .is_some_and(|entry| entry.is_fresh(now, window))
    }
}
