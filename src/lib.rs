//! reporank - rank your GitHub repositories by what you use.
//!
//! Repositories are ordered by when you last opened them through this tool,
//! then by a usage score built from stars and update/push recency. The list is
//! served from a local cache immediately and revalidated in the background once
//! it is older than the freshness window.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use reporank::{FetchScope, FileStore, GitHubClient, SyncCoordinator, SystemClock};
//!
//! let sync = SyncCoordinator::new(
//!     Arc::new(FileStore::in_cache_dir()?),
//!     GitHubClient::new(&token)?,
//!     FetchScope::All,
//!     Arc::new(SystemClock),
//!     Default::default(),
//! );
//! sync.load().await;
//! let state = sync.settled().await;
//! ```

pub mod cache;
pub mod clock;
pub mod config;
pub mod display;
pub mod error;
pub mod fetch;
pub mod github;
pub mod model;
pub mod ranking;
pub mod state;

pub use cache::{CacheEntry, FileStore, KeyValueStore, MemoryStore, RepositoryCache};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, RankingConfig};
pub use error::{FailureKind, FetchFailure, ReporankError, Result, classify};
pub use fetch::{FetchScope, IdentityProvider, RepositoryFetcher};
pub use github::GitHubClient;
pub use model::Repository;
pub use ranking::{AccessTimes, ScoreWeights, rank};
pub use state::{AccessLedger, Refresh, SyncCoordinator, SyncState};
