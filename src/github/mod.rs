// GitHub API module.
// Provides the client that lists repositories and identifies the viewer.

pub mod client;
mod convert;
pub mod endpoints;
pub mod types;

pub use client::GitHubClient;
pub use types::*;
