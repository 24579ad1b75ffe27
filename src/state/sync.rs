// Sync coordinator.
// Shows cached repositories at once, revalidates them in the background, and re-ranks on access.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, watch};

use crate::cache::{KeyValueStore, RepositoryCache};
use crate::clock::Clock;
use crate::config::RankingConfig;
use crate::error::{FetchFailure, Result};
use crate::fetch::{FetchScope, RepositoryFetcher};
use crate::model::Repository;
use crate::ranking::rank;

use super::ledger::AccessLedger;

/// What the consumer should be showing.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SyncState {
    /// Nothing to show yet; a fetch is pending.
    #[default]
    Loading,
    /// Cached data within the freshness window. No fetch is running.
    ShowingCacheFresh { repositories: Vec<Repository> },
    /// Cached data past the freshness window while a fetch runs.
    ShowingCacheStaleRefreshing { repositories: Vec<Repository> },
    /// Data from a fetch that completed in this session.
    ShowingFresh { repositories: Vec<Repository> },
    /// The last fetch failed. Whatever was on screen stays alongside the failure.
    Errored {
        failure: FetchFailure,
        repositories: Vec<Repository>,
    },
}

impl SyncState {
    /// Repositories to display, in rank order.
    pub fn repositories(&self) -> &[Repository] {
        match self {
            SyncState::Loading => &[],
            SyncState::ShowingCacheFresh { repositories }
            | SyncState::ShowingCacheStaleRefreshing { repositories }
            | SyncState::ShowingFresh { repositories }
            | SyncState::Errored { repositories, .. } => repositories,
        }
    }

    fn repositories_mut(&mut self) -> Option<&mut Vec<Repository>> {
        match self {
            SyncState::Loading => None,
            SyncState::ShowingCacheFresh { repositories }
            | SyncState::ShowingCacheStaleRefreshing { repositories }
            | SyncState::ShowingFresh { repositories }
            | SyncState::Errored { repositories, .. } => Some(repositories),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SyncState::Loading)
    }

    /// Whether a fetch is still expected to change what is shown.
    pub fn is_refreshing(&self) -> bool {
        matches!(
            self,
            SyncState::Loading | SyncState::ShowingCacheStaleRefreshing { .. }
        )
    }

    pub fn is_settled(&self) -> bool {
        !self.is_refreshing()
    }

    pub fn failure(&self) -> Option<&FetchFailure> {
        match self {
            SyncState::Errored { failure, .. } => Some(failure),
            _ => None,
        }
    }
}

/// Outcome of a load request with respect to the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// A background fetch was started.
    Started,
    /// A fetch was already in flight; its result will be published.
    AlreadyRunning,
    /// The cache is fresh.
    NotNeeded,
}

/// Drives one repository listing through cache, fetch, and ranking.
///
/// Cheap to clone; clones share state.
pub struct SyncCoordinator<S, F> {
    inner: Arc<Inner<S, F>>,
}

impl<S, F> Clone for SyncCoordinator<S, F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<S, F> {
    ledger: AccessLedger<S>,
    cache: RepositoryCache<S>,
    fetcher: F,
    scope: FetchScope,
    clock: Arc<dyn Clock>,
    config: RankingConfig,
    state: watch::Sender<SyncState>,
    refreshing: AtomicBool,
    // Held while reading access times through publishing a ranking built from them.
    publish_lock: Mutex<()>,
}

/// Clears the in-flight flag when dropped, including when the refresh task panics.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S, F> SyncCoordinator<S, F>
where
    S: KeyValueStore + 'static,
    F: RepositoryFetcher + 'static,
{
    pub fn new(
        store: Arc<S>,
        fetcher: F,
        scope: FetchScope,
        clock: Arc<dyn Clock>,
        config: RankingConfig,
    ) -> Self {
        let (state, _) = watch::channel(SyncState::Loading);
        let cache = RepositoryCache::new(Arc::clone(&store), scope.cache_key());

        Self {
            inner: Arc::new(Inner {
                ledger: AccessLedger::new(store),
                cache,
                fetcher,
                scope,
                clock,
                config: config.validated(),
                state,
                refreshing: AtomicBool::new(false),
                publish_lock: Mutex::new(()),
            }),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SyncState {
        self.inner.state.borrow().clone()
    }

    /// Receive every state change.
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.inner.state.subscribe()
    }

    /// Wait until no fetch is pending and return the resulting state.
    ///
    /// Call after [`load`](Self::load); before the first load this waits for one.
    pub async fn settled(&self) -> SyncState {
        let mut rx = self.subscribe();
        match rx.wait_for(SyncState::is_settled).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    /// Show cached repositories if any, and revalidate when missing or stale.
    ///
    /// Returns once the cached set (if any) is published; the fetch continues in
    /// the background.
    pub async fn load(&self) -> Refresh {
        self.load_with(false).await
    }

    /// Like [`load`](Self::load), but revalidates even a fresh cache.
    pub async fn reload(&self) -> Refresh {
        self.load_with(true).await
    }

    async fn load_with(&self, force: bool) -> Refresh {
        let inner = &self.inner;

        if inner.refreshing.load(Ordering::Acquire) {
            tracing::debug!("Refresh already in flight");
            return Refresh::AlreadyRunning;
        }

        {
            let _guard = inner.publish_lock.lock().await;
            let (times, cached) = tokio::join!(inner.ledger.get_all(), inner.cache.read());
            let now = inner.clock.now();

            let next = match cached {
                Some(entry) => {
                    let fresh = entry.is_fresh(now, inner.config.freshness_window());
                    let repositories = rank(&entry.repositories, &times);
                    tracing::debug!(
                        count = repositories.len(),
                        fetched_at = %entry.fetched_at,
                        fresh,
                        "Showing cached repositories"
                    );

                    if fresh && !force {
                        inner
                            .state
                            .send_replace(SyncState::ShowingCacheFresh { repositories });
                        return Refresh::NotNeeded;
                    }
                    SyncState::ShowingCacheStaleRefreshing { repositories }
                }
                None => {
                    tracing::debug!(key = inner.cache.key(), "No cached repositories");
                    SyncState::Loading
                }
            };

            // Claim the flag before publishing a refreshing state so one is never
            // shown without a fetch behind it.
            if inner
                .refreshing
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return Refresh::AlreadyRunning;
            }
            inner.state.send_replace(next);
        }

        let this = self.clone();
        tokio::spawn(async move {
            this.refresh(InFlight(&this.inner.refreshing)).await;
        });

        Refresh::Started
    }

    async fn refresh(&self, in_flight: InFlight<'_>) {
        let inner = &self.inner;
        tracing::info!(scope = ?inner.scope, "Refreshing repositories");

        let result = inner.scope.fetch(&inner.fetcher).await;

        let _guard = inner.publish_lock.lock().await;
        // Settled observers may load again right away.
        drop(in_flight);
        match result {
            Ok(mut repositories) => {
                let now = inner.clock.now();
                inner.config.weights().apply(&mut repositories, now);

                if let Err(e) = inner.cache.write(&repositories, now).await {
                    tracing::warn!(error = %e, "Failed to write repository cache");
                }

                let times = inner.ledger.get_all().await;
                let ranked = rank(&repositories, &times);
                tracing::info!(count = ranked.len(), "Repositories refreshed");
                inner
                    .state
                    .send_replace(SyncState::ShowingFresh { repositories: ranked });
            }
            Err(e) => {
                let failure = FetchFailure::from(&e);
                tracing::warn!(kind = ?failure.kind, error = %e, "Failed to fetch repositories");
                inner.state.send_modify(|state| {
                    let repositories = state.repositories().to_vec();
                    *state = SyncState::Errored {
                        failure,
                        repositories,
                    };
                });
            }
        }
    }

    /// Record that the user opened or copied `id`, then re-rank what is shown.
    ///
    /// Only the held set is reordered; nothing is fetched.
    pub async fn record_access(&self, id: &str) -> Result<()> {
        let inner = &self.inner;
        let _guard = inner.publish_lock.lock().await;

        inner.ledger.record_access(id, inner.clock.now()).await?;
        let times = inner.ledger.get_all().await;

        inner.state.send_modify(|state| {
            if let Some(repositories) = state.repositories_mut() {
                *repositories = rank(repositories, &times);
            }
        });
        Ok(())
    }

    /// Find a held repository by id or `owner/name`.
    pub fn find(&self, key: &str) -> Option<Repository> {
        self.inner
            .state
            .borrow()
            .repositories()
            .iter()
            .find(|repo| repo.matches(key))
            .cloned()
    }
}
