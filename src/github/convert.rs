// Conversion from GitHub wire types to domain repositories.

use crate::model::Repository;

use super::types::GitHubRepository;

impl From<GitHubRepository> for Repository {
    fn from(repo: GitHubRepository) -> Self {
        Repository {
            id: repo.id.to_string(),
            owner: repo.owner.login,
            name: repo.name,
            full_name: repo.full_name,
            description: repo.description.filter(|d| !d.is_empty()),
            url: repo.html_url,
            stars: repo.stargazers_count,
            is_private: repo.private,
            updated_at: repo.updated_at,
            pushed_at: repo.pushed_at.unwrap_or(repo.updated_at),
            usage_score: 0.0,
        }
    }
}
