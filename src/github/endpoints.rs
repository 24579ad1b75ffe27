// GitHub API endpoint functions.
// Typed, paginated repository listings and the identity lookup.

use std::collections::HashSet;
use std::future::Future;

use async_trait::async_trait;

use crate::error::{ReporankError, Result};
use crate::fetch::{IdentityProvider, RepositoryFetcher};
use crate::model::Repository;

use super::client::GitHubClient;
use super::types::{GitHubRepository, Owner};

/// Maximum page size the list endpoints accept.
const PER_PAGE: u32 = 100;

/// Hard stop for runaway pagination (10k repositories).
const MAX_PAGES: u32 = 100;

impl GitHubClient {
    /// Get the authenticated user.
    pub async fn get_current_user(&self) -> Result<Owner> {
        let response = self.get("/user").await?;
        let user: Owner = response.json().await?;
        Ok(user)
    }

    /// Get one page of repositories accessible to the authenticated user.
    pub async fn get_user_repos(&self, page: u32, per_page: u32) -> Result<Vec<GitHubRepository>> {
        let params = [
            ("affiliation", "owner,collaborator,organization_member".to_string()),
            ("sort", "updated".to_string()),
            ("direction", "desc".to_string()),
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
        ];
        let response = self.get_with_params("/user/repos", &params).await?;
        let repos: Vec<GitHubRepository> = response.json().await?;
        Ok(repos)
    }

    /// Get one page of repositories for an organization.
    pub async fn get_org_repos(
        &self,
        org: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<GitHubRepository>> {
        let params = [
            ("sort", "updated".to_string()),
            ("direction", "desc".to_string()),
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
        ];
        let response = self
            .get_with_params(&format!("/orgs/{}/repos", org), &params)
            .await?;
        let repos: Vec<GitHubRepository> = response.json().await?;
        Ok(repos)
    }

    /// Get one page of repositories for a user account.
    pub async fn get_owner_repos(
        &self,
        owner: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<GitHubRepository>> {
        let params = [
            ("sort", "updated".to_string()),
            ("direction", "desc".to_string()),
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
        ];
        let response = self
            .get_with_params(&format!("/users/{}/repos", owner), &params)
            .await?;
        let repos: Vec<GitHubRepository> = response.json().await?;
        Ok(repos)
    }
}

/// Walk pages until a short page, keeping the first occurrence of each id.
async fn collect_pages<F, Fut>(mut fetch_page: F) -> Result<Vec<Repository>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<GitHubRepository>>>,
{
    let mut seen = HashSet::new();
    let mut repositories = Vec::new();

    for page in 1..=MAX_PAGES {
        let batch = fetch_page(page).await?;
        let last_page = batch.len() < PER_PAGE as usize;

        for raw in batch {
            if seen.insert(raw.id) {
                repositories.push(Repository::from(raw));
            }
        }

        if last_page {
            tracing::debug!(count = repositories.len(), "Collected repository pages");
            return Ok(repositories);
        }
    }

    tracing::warn!(
        max_pages = MAX_PAGES,
        count = repositories.len(),
        "Repository listing truncated at page limit"
    );
    Ok(repositories)
}

#[async_trait]
impl RepositoryFetcher for GitHubClient {
    async fn fetch_repositories(&self) -> Result<Vec<Repository>> {
        collect_pages(|page| self.get_user_repos(page, PER_PAGE)).await
    }

    async fn fetch_repositories_by_owner(&self, owner: &str) -> Result<Vec<Repository>> {
        match collect_pages(|page| self.get_org_repos(owner, page, PER_PAGE)).await {
            Err(ReporankError::NotFound(_)) => {
                tracing::debug!(owner, "Not an organization, listing user repositories");
                collect_pages(|page| self.get_owner_repos(owner, page, PER_PAGE)).await
            }
            result => result,
        }
    }
}

#[async_trait]
impl IdentityProvider for GitHubClient {
    async fn current_login(&self) -> Result<String> {
        Ok(self.get_current_user().await?.login)
    }
}
