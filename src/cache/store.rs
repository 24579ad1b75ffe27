// Durable key-value store.
// String values keyed by name; the file-backed store writes one JSON file per key, atomically.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{ReporankError, Result};

use super::paths;

/// Persistent string storage scoped to the running user.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value for `key`, or `None` if it was never written.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value for `key`.
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Store backed by files in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at the user's cache directory.
    pub fn in_cache_dir() -> Result<Self> {
        paths::cache_dir()
            .map(Self::new)
            .ok_or_else(|| ReporankError::Other("Could not determine cache directory".to_string()))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = paths::key_path(&self.dir, key);
        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;

        let path = paths::key_path(&self.dir, key);

        // Write atomically via temp file
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(value.as_bytes()).await?;
        file.sync_all().await?;
        fs::rename(&temp_path, &path).await?;

        Ok(())
    }
}

/// Store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("nested"));

        store.set("access-times", r#"{"1":"x"}"#).await.unwrap();
        let value = store.get("access-times").await.unwrap();
        assert_eq!(value.as_deref(), Some(r#"{"1":"x"}"#));

        store.set("access-times", "{}").await.unwrap();
        assert_eq!(store.get("access-times").await.unwrap().as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn test_file_store_missing_key() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());
        assert!(store.get("nothing-here").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());
        store.set("repositories/owner/octo", "[]").await.unwrap();

        let names: Vec<String> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["repositories_owner_octo.json".to_string()]);
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryStore::new();
        assert!(store.get("k").await.unwrap().is_none());
        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
