//! End-to-end tests for loading, refreshing, and re-ranking repository lists.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tempfile::TempDir;

use reporank::{
    AccessLedger, FetchScope, FileStore, FixedClock, KeyValueStore, MemoryStore, RankingConfig,
    Refresh, ReporankError, Repository, RepositoryCache, RepositoryFetcher, Result,
    SyncCoordinator, SyncState,
};

fn repo(id: &str, owner: &str, stars: u64, at: DateTime<Utc>) -> Repository {
    Repository {
        id: id.to_string(),
        owner: owner.to_string(),
        name: id.to_string(),
        full_name: format!("{}/{}", owner, id),
        description: None,
        url: format!("https://github.com/{}/{}", owner, id),
        stars,
        is_private: false,
        updated_at: at,
        pushed_at: at,
        usage_score: 0.0,
    }
}

/// Fetcher that answers immediately with a fixed list and counts calls.
struct StaticFetcher {
    repositories: Vec<Repository>,
    calls: AtomicUsize,
}

impl StaticFetcher {
    fn new(repositories: Vec<Repository>) -> Arc<Self> {
        Arc::new(Self {
            repositories,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RepositoryFetcher for StaticFetcher {
    async fn fetch_repositories(&self) -> Result<Vec<Repository>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.repositories.clone())
    }

    async fn fetch_repositories_by_owner(&self, owner: &str) -> Result<Vec<Repository>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .repositories
            .iter()
            .filter(|r| r.is_owned_by(owner))
            .cloned()
            .collect())
    }
}

/// Fetcher that must never be reached.
struct UnreachableFetcher;

#[async_trait]
impl RepositoryFetcher for UnreachableFetcher {
    async fn fetch_repositories(&self) -> Result<Vec<Repository>> {
        Err(ReporankError::Other("fetch must not run".to_string()))
    }

    async fn fetch_repositories_by_owner(&self, _owner: &str) -> Result<Vec<Repository>> {
        Err(ReporankError::Other("fetch must not run".to_string()))
    }
}

fn ids(state: &SyncState) -> Vec<&str> {
    state.repositories().iter().map(|r| r.id.as_str()).collect()
}

#[tokio::test]
async fn cold_start_ranks_by_stars_when_recency_is_equal() {
    let now = Utc::now();
    let fetcher = StaticFetcher::new(vec![
        repo("zero", "octocat", 0, now),
        repo("five", "octocat", 5, now),
        repo("ten", "octocat", 10, now),
    ]);
    let store = Arc::new(MemoryStore::new());
    let sync = SyncCoordinator::new(
        store.clone(),
        fetcher.clone(),
        FetchScope::All,
        Arc::new(FixedClock::new(now)),
        RankingConfig::default(),
    );

    assert!(sync.state().is_loading());
    assert_eq!(sync.load().await, Refresh::Started);

    let state = sync.settled().await;
    assert!(matches!(state, SyncState::ShowingFresh { .. }));
    assert_eq!(ids(&state), vec!["ten", "five", "zero"]);
    assert_eq!(state.repositories()[0].usage_score, 220.0);
    assert_eq!(fetcher.calls(), 1);

    // The fetched set is now cached, so a second coordinator starts from it.
    let again = SyncCoordinator::new(
        store,
        UnreachableFetcher,
        FetchScope::All,
        Arc::new(FixedClock::new(now + Duration::minutes(1))),
        RankingConfig::default(),
    );
    assert_eq!(again.load().await, Refresh::NotNeeded);
    assert_eq!(ids(&again.state()), vec!["ten", "five", "zero"]);
}

#[tokio::test]
async fn fresh_cache_shows_recent_access_first_without_fetching() {
    let now = Utc::now();
    let store = Arc::new(MemoryStore::new());

    let mut cached = vec![
        repo("popular", "octocat", 1000, now),
        repo("x", "octocat", 0, now - Duration::days(300)),
        repo("other", "octocat", 50, now),
    ];
    reporank::ScoreWeights::default().apply(&mut cached, now);
    RepositoryCache::new(store.clone(), FetchScope::All.cache_key())
        .write(&cached, now - Duration::minutes(1))
        .await
        .unwrap();

    let ledger = AccessLedger::new(store.clone());
    ledger
        .record_access("popular", now - Duration::days(2))
        .await
        .unwrap();
    ledger
        .record_access("x", now - Duration::hours(1))
        .await
        .unwrap();

    let sync = SyncCoordinator::new(
        store,
        UnreachableFetcher,
        FetchScope::All,
        Arc::new(FixedClock::new(now)),
        RankingConfig::default(),
    );

    assert_eq!(sync.load().await, Refresh::NotNeeded);
    let state = sync.state();
    assert!(matches!(state, SyncState::ShowingCacheFresh { .. }));
    assert_eq!(ids(&state), vec!["x", "popular", "other"]);
}

#[tokio::test]
async fn stale_cache_is_revalidated_with_access_order_kept() {
    let now = Utc::now();
    let store = Arc::new(MemoryStore::new());
    RepositoryCache::new(store.clone(), FetchScope::All.cache_key())
        .write(&[repo("a", "octocat", 1, now)], now - Duration::minutes(5))
        .await
        .unwrap();
    AccessLedger::new(store.clone())
        .record_access("b", now - Duration::minutes(30))
        .await
        .unwrap();

    let fetcher = StaticFetcher::new(vec![
        repo("a", "octocat", 900, now),
        repo("b", "octocat", 0, now - Duration::days(90)),
    ]);
    let sync = SyncCoordinator::new(
        store,
        fetcher.clone(),
        FetchScope::All,
        Arc::new(FixedClock::new(now)),
        RankingConfig::default(),
    );

    let mut updates = sync.subscribe();
    assert_eq!(sync.load().await, Refresh::Started);

    let shown = updates.borrow_and_update().clone();
    assert!(matches!(shown, SyncState::ShowingCacheStaleRefreshing { .. }));
    assert_eq!(ids(&shown), vec!["a"]);

    let state = sync.settled().await;
    assert!(matches!(state, SyncState::ShowingFresh { .. }));
    assert_eq!(ids(&state), vec!["b", "a"]);
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn owner_scope_uses_its_own_cache_entry() {
    let now = Utc::now();
    let store = Arc::new(MemoryStore::new());
    let fetcher = StaticFetcher::new(vec![
        repo("mine", "octocat", 1, now),
        repo("theirs", "rust-lang", 1, now),
    ]);

    let scoped = SyncCoordinator::new(
        store.clone(),
        fetcher.clone(),
        FetchScope::Owner("rust-lang".to_string()),
        Arc::new(FixedClock::new(now)),
        RankingConfig::default(),
    );
    scoped.load().await;
    assert_eq!(ids(&scoped.settled().await), vec!["theirs"]);

    assert!(store.get(&FetchScope::All.cache_key()).await.unwrap().is_none());
    assert!(
        store
            .get("repositories/owner/rust-lang")
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn accesses_survive_restart_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let now = Utc::now();
    let fetched = vec![
        repo("big", "octocat", 500, now),
        repo("small", "octocat", 0, now),
    ];

    {
        let sync = SyncCoordinator::new(
            Arc::new(FileStore::new(temp_dir.path())),
            StaticFetcher::new(fetched.clone()),
            FetchScope::All,
            Arc::new(FixedClock::new(now)),
            RankingConfig::default(),
        );
        sync.load().await;
        assert_eq!(ids(&sync.settled().await), vec!["big", "small"]);

        sync.record_access("small").await.unwrap();
        assert_eq!(ids(&sync.state()), vec!["small", "big"]);
    }

    let clock = Arc::new(FixedClock::new(now + Duration::minutes(2)));
    let sync = SyncCoordinator::new(
        Arc::new(FileStore::new(temp_dir.path())),
        UnreachableFetcher,
        FetchScope::All,
        clock,
        RankingConfig::default(),
    );
    assert_eq!(sync.load().await, Refresh::NotNeeded);
    assert_eq!(ids(&sync.state()), vec!["small", "big"]);
}

#[tokio::test]
async fn custom_freshness_window_controls_revalidation() {
    let now = Utc::now();
    let store = Arc::new(MemoryStore::new());
    RepositoryCache::new(store.clone(), FetchScope::All.cache_key())
        .write(&[repo("a", "octocat", 1, now)], now - Duration::minutes(20))
        .await
        .unwrap();

    let config = RankingConfig {
        freshness_window_secs: 60 * 60,
        ..RankingConfig::default()
    };
    let sync = SyncCoordinator::new(
        store,
        UnreachableFetcher,
        FetchScope::All,
        Arc::new(FixedClock::new(now)),
        config,
    );

    assert_eq!(sync.load().await, Refresh::NotNeeded);
    assert!(matches!(sync.state(), SyncState::ShowingCacheFresh { .. }));
}
