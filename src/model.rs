// Domain types for ranked repositories.
// Source-independent repository records as held in memory and in the cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A repository as seen by the ranking engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    /// Opaque identifier, stable across fetches.
    pub id: String,
    pub owner: String,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    /// Canonical web address.
    pub url: String,
    pub stars: u64,
    pub is_private: bool,
    pub updated_at: DateTime<Utc>,
    pub pushed_at: DateTime<Utc>,
    /// Computed by the score calculator when the set is fetched.
    #[serde(default)]
    pub usage_score: f64,
}

impl Repository {
    /// Whether the repository belongs to the given login (case-insensitive, as GitHub logins are).
    pub fn is_owned_by(&self, login: &str) -> bool {
        self.owner.eq_ignore_ascii_case(login)
    }

    /// Match either the opaque id or the `owner/name` form.
    pub fn matches(&self, key: &str) -> bool {
        self.id == key || self.full_name.eq_ignore_ascii_case(key)
    }
}
