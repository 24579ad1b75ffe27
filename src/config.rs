//! Configuration file support for reporank.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. Environment variables (prefixed with `REPORANK_`, sections split by `__`,
//!    e.g. `REPORANK_RANKING__STAR_WEIGHT=3`)
//! 2. Local config file (./reporank.toml)
//! 3. User config file (~/.config/reporank/config.toml)
//! 4. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [ranking]
//! freshness_window_secs = 300
//! decay_days = 30.0
//! star_weight = 2.0
//!
//! [github]
//! token = "ghp_..."  # or use GITHUB_TOKEN
//!
//! [storage]
//! dir = "/tmp/reporank"  # defaults to the user cache directory
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;

use crate::cache::{DEFAULT_FRESHNESS_WINDOW, paths};
use crate::ranking::{DEFAULT_DECAY_DAYS, DEFAULT_STAR_WEIGHT, ScoreWeights};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ranking: RankingConfig,
    pub github: GitHubConfig,
    pub storage: StorageConfig,
}

/// Ranking and cache freshness parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Maximum age of the cached list before it is revalidated.
    pub freshness_window_secs: u64,
    /// Characteristic decay scale of the recency terms, in days.
    pub decay_days: f64,
    /// Points per star.
    pub star_weight: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            freshness_window_secs: DEFAULT_FRESHNESS_WINDOW.as_secs(),
            decay_days: DEFAULT_DECAY_DAYS,
            star_weight: DEFAULT_STAR_WEIGHT,
        }
    }
}

impl RankingConfig {
    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.freshness_window_secs)
    }

    pub fn weights(&self) -> ScoreWeights {
        ScoreWeights {
            star_weight: self.star_weight,
            decay_days: self.decay_days,
        }
    }

    /// Replace weights that would make scores non-finite or decrease with stars.
    pub fn validated(mut self) -> Self {
        if !(self.star_weight.is_finite() && self.star_weight >= 0.0) {
            tracing::warn!(
                star_weight = self.star_weight,
                "Invalid ranking.star_weight, using {}",
                DEFAULT_STAR_WEIGHT
            );
            self.star_weight = DEFAULT_STAR_WEIGHT;
        }
        if !(self.decay_days.is_finite() && self.decay_days > 0.0) {
            tracing::warn!(
                decay_days = self.decay_days,
                "Invalid ranking.decay_days, using {}",
                DEFAULT_DECAY_DAYS
            );
            self.decay_days = DEFAULT_DECAY_DAYS;
        }
        self
    }
}

/// GitHub configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// GitHub API token. Falls back to the GITHUB_TOKEN environment variable.
    pub token: Option<String>,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for the cache and access ledger.
    pub dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from files and environment, falling back to defaults on error.
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(user_config) = paths::config_path() {
            if user_config.exists() {
                tracing::debug!("Loading config from {:?}", user_config);
                builder = builder.add_source(
                    File::from(user_config)
                        .format(FileFormat::Toml)
                        .required(false),
                );
            }
        }

        let local_config = PathBuf::from("reporank.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./reporank.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix("REPORANK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config.validated(),
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Parse configuration from a TOML string, layered over defaults.
    pub fn from_toml(source: &str) -> Result<Self, config::ConfigError> {
        ConfigBuilder::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?
            .try_deserialize()
            .map(Config::validated)
    }

    fn validated(mut self) -> Self {
        self.ranking = self.ranking.validated();
        self
    }

    /// The GitHub token from config, or the GITHUB_TOKEN environment variable.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .filter(|token| !token.is_empty())
    }

    /// Storage directory, defaulting to the user cache directory.
    pub fn storage_dir(&self) -> Option<PathBuf> {
        self.storage.dir.clone().or_else(paths::cache_dir)
    }
}
