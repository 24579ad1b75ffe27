// GitHub API HTTP client.
// Handles authentication, rate limiting, and request/response processing.

use std::sync::Mutex;

use reqwest::{
    Client, Response, StatusCode,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
};

use crate::error::{ReporankError, Result};

use super::types::RateLimit;

const GITHUB_API_BASE: &str = "https://api.github.com";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// GitHub API client with authentication and rate limit tracking.
pub struct GitHubClient {
    client: Client,
    rate_limit: Mutex<RateLimit>,
}

impl GitHubClient {
    /// Create a new GitHub client with the given token.
    pub fn new(token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();

        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ReporankError::Other(e.to_string()))?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("reporank"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(ReporankError::Api)?;

        Ok(Self {
            client,
            rate_limit: Mutex::new(RateLimit::default()),
        })
    }

    /// Create a client from an optional configured token.
    pub fn from_token(token: Option<String>) -> Result<Self> {
        let token = token.ok_or(ReporankError::MissingToken)?;
        Self::new(&token)
    }

    /// Get the current rate limit information.
    pub fn rate_limit(&self) -> RateLimit {
        self.rate_limit
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Make a GET request to the GitHub API.
    pub async fn get(&self, endpoint: &str) -> Result<Response> {
        let url = format!("{}{}", GITHUB_API_BASE, endpoint);
        let response = self.client.get(&url).send().await.map_err(ReporankError::Api)?;

        self.update_rate_limit(response.headers());
        self.check_response(response).await
    }

    /// Make a GET request with query parameters.
    pub async fn get_with_params<T: serde::Serialize + ?Sized>(
        &self,
        endpoint: &str,
        params: &T,
    ) -> Result<Response> {
        let url = format!("{}{}", GITHUB_API_BASE, endpoint);
        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(ReporankError::Api)?;

        self.update_rate_limit(response.headers());
        self.check_response(response).await
    }

    /// Update rate limit from response headers.
    fn update_rate_limit(&self, headers: &HeaderMap) {
        let mut rate_limit = self.rate_limit.lock().unwrap_or_else(|e| e.into_inner());
        apply_rate_limit_headers(headers, &mut rate_limit);
    }

    /// Check response status and convert errors.
    async fn check_response(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &self.rate_limit(), &url, &body))
    }
}

fn apply_rate_limit_headers(headers: &HeaderMap, rate_limit: &mut RateLimit) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
    };

    if let Some(limit) = header("x-ratelimit-limit") {
        rate_limit.limit = limit;
    }
    if let Some(remaining) = header("x-ratelimit-remaining") {
        rate_limit.remaining = remaining;
    }
    if let Some(reset) = header("x-ratelimit-reset") {
        rate_limit.reset = reset;
    }
}

/// Map a failed response to an error.
fn status_error(status: StatusCode, rate_limit: &RateLimit, url: &str, body: &str) -> ReporankError {
    let rate_limited = || {
        let reset_at = chrono::DateTime::from_timestamp(rate_limit.reset as i64, 0)
            .map(|dt| dt.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        ReporankError::RateLimited { reset_at }
    };

    match status {
        StatusCode::UNAUTHORIZED => ReporankError::Unauthorized,
        StatusCode::NOT_FOUND => ReporankError::NotFound(url.to_string()),
        StatusCode::TOO_MANY_REQUESTS => rate_limited(),
        // A 403 with an exhausted quota is a rate limit; otherwise it is a permissions problem
        StatusCode::FORBIDDEN if rate_limit.remaining == 0 && rate_limit.limit > 0 => rate_limited(),
        StatusCode::FORBIDDEN => ReporankError::Forbidden(body.to_string()),
        status => ReporankError::Other(format!("HTTP {}: {}", status, body)),
    }
}
