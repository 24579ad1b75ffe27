// Remote collaborators.
// Traits for listing repositories and identifying the viewer, plus the scope of a listing.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::Repository;

/// Source of repository listings.
///
/// Implementors handle pagination themselves and return a finite, ordered set
/// with no duplicate ids. `usage_score` is left for the caller to fill in.
#[async_trait]
pub trait RepositoryFetcher: Send + Sync {
    /// All repositories visible to the authenticated user.
    async fn fetch_repositories(&self) -> Result<Vec<Repository>>;

    /// Repositories belonging to one user or organization.
    async fn fetch_repositories_by_owner(&self, owner: &str) -> Result<Vec<Repository>>;
}

#[async_trait]
impl<T: RepositoryFetcher + ?Sized> RepositoryFetcher for Arc<T> {
    async fn fetch_repositories(&self) -> Result<Vec<Repository>> {
        (**self).fetch_repositories().await
    }

    async fn fetch_repositories_by_owner(&self, owner: &str) -> Result<Vec<Repository>> {
        (**self).fetch_repositories_by_owner(owner).await
    }
}

/// Supplies the authenticated user's login. Used only to flag repositories the viewer doesn't own.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_login(&self) -> Result<String>;
}

/// Which listing a coordinator keeps in sync.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FetchScope {
    #[default]
    All,
    Owner(String),
}

impl FetchScope {
    /// Store key of the cache entry for this listing.
    pub fn cache_key(&self) -> String {
        match self {
            FetchScope::All => "repositories".to_string(),
            FetchScope::Owner(owner) => format!("repositories/owner/{}", owner.to_lowercase()),
        }
    }

    pub async fn fetch<F: RepositoryFetcher + ?Sized>(&self, fetcher: &F) -> Result<Vec<Repository>> {
        match self {
            FetchScope::All => fetcher.fetch_repositories().await,
            FetchScope::Owner(owner) => fetcher.fetch_repositories_by_owner(owner).await,
        }
    }
}
