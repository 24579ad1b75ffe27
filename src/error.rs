// Error types for reporank.
// Covers GitHub API errors, storage errors, and the user-facing fetch failure classifier.

use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReporankError {
    #[error("GitHub API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Authentication failed: invalid or expired token")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded, resets at {reset_at}")]
    RateLimited { reset_at: String },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Missing GITHUB_TOKEN environment variable")]
    MissingToken,

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ReporankError>;

/// Category of a failed repository fetch, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Invalid or expired credential.
    Authentication,
    RateLimit,
    /// Connectivity or DNS.
    Network,
    /// Credential is valid but lacks an organization-level grant (SSO/SAML).
    AuthorizationScope,
    Unknown,
}

impl FailureKind {
    /// Message shown in place of the raw failure. `None` means show the original text.
    fn user_message(&self) -> Option<&'static str> {
        match self {
            FailureKind::Authentication => {
                Some("Invalid or expired GitHub token. Check your credentials and try again.")
            }
            FailureKind::RateLimit => Some("GitHub rate limit reached. Try again later."),
            FailureKind::Network => {
                Some("Could not reach GitHub. Check your network connection.")
            }
            FailureKind::AuthorizationScope => Some(
                "Your token is not authorized for one of your organizations. \
                 Authorize it for SSO/SAML and try again.",
            ),
            FailureKind::Unknown => None,
        }
    }
}

/// A classified fetch failure, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub kind: FailureKind,
    /// User-facing message.
    pub message: String,
    /// The raw failure description.
    pub detail: String,
}

impl FetchFailure {
    fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        let message = kind
            .user_message()
            .map(str::to_string)
            .unwrap_or_else(|| detail.clone());
        Self {
            kind,
            message,
            detail,
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<&ReporankError> for FetchFailure {
    fn from(err: &ReporankError) -> Self {
        let detail = err.to_string();
        match err {
            ReporankError::Unauthorized | ReporankError::MissingToken => {
                FetchFailure::new(FailureKind::Authentication, detail)
            }
            ReporankError::RateLimited { .. } => FetchFailure::new(FailureKind::RateLimit, detail),
            ReporankError::Api(e) if e.is_connect() || e.is_timeout() => {
                FetchFailure::new(FailureKind::Network, detail)
            }
            _ => classify(&detail),
        }
    }
}

// Checked in order; organization grant failures also mention 403/forbidden,
// so they must win over the generic patterns.
const SCOPE_PATTERNS: &[&str] = &[
    "saml",
    "single sign-on",
    "oauth app access restrictions",
    "resource protected by organization",
];
const RATE_LIMIT_PATTERNS: &[&str] = &["rate limit", "429", "too many requests"];
const AUTH_PATTERNS: &[&str] = &[
    "bad credentials",
    "unauthorized",
    "401",
    "authentication failed",
    "invalid or expired token",
    "missing github_token",
];
const NETWORK_PATTERNS: &[&str] = &[
    "enotfound",
    "econnrefused",
    "econnreset",
    "etimedout",
    "getaddrinfo",
    "dns",
    "network",
    "connection",
    "timed out",
    "error sending request",
];

/// Classify a raw failure description into exactly one [`FailureKind`].
pub fn classify(description: &str) -> FetchFailure {
    let lowered = description.to_lowercase();
    let matches = |patterns: &[&str]| patterns.iter().any(|p| lowered.contains(p));

    let kind = if matches(SCOPE_PATTERNS) {
        FailureKind::AuthorizationScope
    } else if matches(RATE_LIMIT_PATTERNS) {
        FailureKind::RateLimit
    } else if matches(AUTH_PATTERNS) {
        FailureKind::Authentication
    } else if matches(NETWORK_PATTERNS) {
        FailureKind::Network
    } else {
        FailureKind::Unknown
    };

    FetchFailure::new(kind, description)
}
