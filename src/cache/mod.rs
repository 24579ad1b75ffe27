// Cache module for local persistence.
// Stores the last fetched repository list behind a pluggable key-value store.

pub mod paths;
pub mod repos;
pub mod store;

pub use repos::{CacheEntry, DEFAULT_FRESHNESS_WINDOW, RepositoryCache};
pub use store::{FileStore, KeyValueStore, MemoryStore};
