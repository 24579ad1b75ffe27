// Cache path utilities.
// Resolves the per-user storage directory and maps store keys to file names.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

/// Get the base cache directory (~/.cache/reporank on Linux).
pub fn cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "reporank").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Path to the config file in the user's config directory.
pub fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "reporank").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Path of the JSON file backing a store key.
pub fn key_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{}.json", sanitize_name(key)))
}

/// Sanitize a name for use in filesystem paths.
/// Replaces problematic characters with underscores.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}
