// reporank command-line entry point.
// Lists repositories in rank order and records opens.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use reporank::display::{format_repository, status_label};
use reporank::{
    Clock, Config, FetchFailure, FetchScope, FileStore, GitHubClient, IdentityProvider,
    KeyValueStore, Refresh, ReporankError, Repository, RepositoryFetcher, Result, SyncCoordinator,
    SyncState, SystemClock,
};

/// Store key of the last known viewer login.
const VIEWER_KEY: &str = "viewer-login";

#[derive(Parser)]
#[command(name = "reporank", version, about = "Your GitHub repositories, most used first")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print repositories in rank order
    List {
        /// Only list repositories of this user or organization
        #[arg(long)]
        owner: Option<String>,
        /// Maximum number of repositories to print
        #[arg(long, default_value_t = 30)]
        limit: usize,
        /// Revalidate even if the cache is fresh
        #[arg(long)]
        refresh: bool,
    },
    /// Record that a repository was opened and print its URL
    Open {
        /// Repository id or owner/name
        repository: String,
        /// Look the repository up in this owner's listing
        #[arg(long)]
        owner: Option<String>,
    },
}

type Coordinator = SyncCoordinator<FileStore, Arc<dyn RepositoryFetcher>>;

/// Stands in for the GitHub client when no token is configured, so cached
/// listings still print and the fetch fails as an authentication error.
struct NoToken;

#[async_trait]
impl RepositoryFetcher for NoToken {
    async fn fetch_repositories(&self) -> Result<Vec<Repository>> {
        Err(ReporankError::MissingToken)
    }

    async fn fetch_repositories_by_owner(&self, _owner: &str) -> Result<Vec<Repository>> {
        Err(ReporankError::MissingToken)
    }
}

#[async_trait]
impl IdentityProvider for NoToken {
    async fn current_login(&self) -> Result<String> {
        Err(ReporankError::MissingToken)
    }
}

struct Remote {
    fetcher: Arc<dyn RepositoryFetcher>,
    identity: Arc<dyn IdentityProvider>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("reporank=warn"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load();

    match run(cli, config).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {}", FetchFailure::from(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: Config) -> Result<bool> {
    let store = Arc::new(FileStore::new(config.storage_dir().ok_or_else(|| {
        ReporankError::Other("Could not determine cache directory".to_string())
    })?));
    let remote = remote(&config)?;
    let mut out = io::stdout().lock();

    match cli.command {
        Command::List {
            owner,
            limit,
            refresh,
        } => {
            let sync = coordinator(&config, store.clone(), remote.fetcher, owner);
            list(&sync, store, remote.identity, limit, refresh, &mut out).await
        }
        Command::Open { repository, owner } => {
            let sync = coordinator(&config, store, remote.fetcher, owner);
            open(&sync, &repository, &mut out).await
        }
    }
}

fn remote(config: &Config) -> Result<Remote> {
    match GitHubClient::from_token(config.github_token()) {
        Ok(client) => {
            let client = Arc::new(client);
            Ok(Remote {
                fetcher: client.clone(),
                identity: client,
            })
        }
        Err(ReporankError::MissingToken) => {
            tracing::debug!("No GitHub token configured");
            Ok(Remote {
                fetcher: Arc::new(NoToken),
                identity: Arc::new(NoToken),
            })
        }
        Err(e) => Err(e),
    }
}

fn coordinator(
    config: &Config,
    store: Arc<FileStore>,
    fetcher: Arc<dyn RepositoryFetcher>,
    owner: Option<String>,
) -> Coordinator {
    let scope = owner.map(FetchScope::Owner).unwrap_or_default();
    SyncCoordinator::new(
        store,
        fetcher,
        scope,
        Arc::new(SystemClock),
        config.ranking.clone(),
    )
}

/// The login seen on a previous run, if any.
async fn stored_viewer(store: &impl KeyValueStore) -> Option<String> {
    match store.get(VIEWER_KEY).await {
        Ok(Some(raw)) => serde_json::from_str(&raw).ok(),
        Ok(None) => None,
        Err(e) => {
            tracing::debug!(error = %e, "Could not read stored viewer");
            None
        }
    }
}

/// Ask the identity provider for the viewer and remember the answer.
async fn lookup_viewer(
    identity: Arc<dyn IdentityProvider>,
    store: Arc<FileStore>,
) -> Option<String> {
    let login = match identity.current_login().await {
        Ok(login) => login,
        Err(e) => {
            tracing::debug!(error = %e, "Could not determine viewer");
            return None;
        }
    };

    match serde_json::to_string(&login) {
        Ok(raw) => {
            if let Err(e) = store.set(VIEWER_KEY, &raw).await {
                tracing::warn!(error = %e, "Failed to store viewer");
            }
        }
        Err(e) => tracing::warn!(error = %e, "Failed to encode viewer"),
    }
    Some(login)
}

async fn list(
    sync: &Coordinator,
    store: Arc<FileStore>,
    identity: Arc<dyn IdentityProvider>,
    limit: usize,
    refresh: bool,
    out: &mut impl Write,
) -> Result<bool> {
    let lookup = tokio::spawn(lookup_viewer(identity, store.clone()));

    let outcome = if refresh {
        sync.reload().await
    } else {
        sync.load().await
    };

    let shown = sync.state();
    let mut viewer = stored_viewer(store.as_ref()).await;
    if !shown.repositories().is_empty() {
        print_state(out, &shown, viewer.as_deref(), limit)?;
    }

    let state = if outcome == Refresh::NotNeeded {
        shown
    } else {
        let settled = sync.settled().await;
        // Never hold the listing for the viewer lookup.
        if lookup.is_finished() {
            if let Ok(Some(login)) = lookup.await {
                viewer = Some(login);
            }
        }
        if settled.repositories() != shown.repositories() || shown.repositories().is_empty() {
            print_state(out, &settled, viewer.as_deref(), limit)?;
        }
        settled
    };

    match state.failure() {
        Some(failure) => {
            eprintln!("error: {}", failure);
            Ok(false)
        }
        None => Ok(true),
    }
}

async fn open(sync: &Coordinator, key: &str, out: &mut impl Write) -> Result<bool> {
    let outcome = sync.load().await;

    let found = match sync.find(key) {
        Some(repo) => Some(repo),
        None => {
            sync.settled().await;
            sync.find(key)
        }
    };

    let Some(repo) = found else {
        eprintln!("error: no repository matching '{}'", key);
        return Ok(false);
    };

    sync.record_access(&repo.id).await?;
    writeln!(out, "{}", repo.url)?;
    out.flush()?;

    // Let a revalidation started here reach the cache before the runtime shuts down.
    if outcome == Refresh::Started {
        sync.settled().await;
    }
    Ok(true)
}

fn print_state(
    out: &mut impl Write,
    state: &SyncState,
    viewer: Option<&str>,
    limit: usize,
) -> Result<()> {
    let now = SystemClock.now();
    writeln!(out, "-- {} --", status_label(state))?;
    for repo in state.repositories().iter().take(limit) {
        writeln!(out, "{}", format_repository(repo, viewer, now))?;
    }
    Ok(())
}
