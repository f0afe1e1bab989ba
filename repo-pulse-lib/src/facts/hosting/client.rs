//! GitHub API client
//!
//! Minimal GitHub REST client for the repository documents the collector needs.

use crate::facts::resilient_http::{RetryPolicy, resilient_get};
use chrono::{DateTime, Utc};
use core::time::Duration;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

/// Repository metadata with only the fields we need
#[derive(Debug, Clone, Deserialize)]
#[expect(clippy::struct_field_names, reason = "field names match GitHub API exactly")]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub watchers_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    #[serde(default)]
    pub size: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
}

/// One entry of the stargazers listing when requested with the `star+json` media type.
///
/// The timestamp is kept raw so that malformed values can be skipped individually.
#[derive(Debug, Clone, Deserialize)]
pub struct Stargazer {
    #[serde(default)]
    pub starred_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Contributor {
    /// Anonymous contributors have no login
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub contributions: u64,
}

/// Which traffic series to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum TrafficKind {
    Clones,
    Views,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficEntry {
    pub timestamp: String,
    pub count: u64,
    pub uniques: u64,
}

/// Clone or view traffic over the last two weeks.
///
/// The API names the per-day list after the traffic kind; both spellings are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TrafficSummary {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub uniques: u64,
    #[serde(default, alias = "clones", alias = "views")]
    pub entries: Vec<TrafficEntry>,
}

/// Rate limit information from response headers
#[derive(Debug, Clone, Copy)]
pub struct RateLimitInfo {
    pub remaining: usize,
    pub reset_at: DateTime<Utc>,
}

/// Result of a hosting API call
#[derive(Debug)]
pub enum HostingApiResult<T> {
    /// Request succeeded - contains data and optional rate limit info
    Success(T, Option<RateLimitInfo>),

    /// Rate limited - should retry after reset time
    RateLimited(RateLimitInfo),

    /// The requested resource was not found (404)
    NotFound(Option<RateLimitInfo>),

    /// Request failed permanently - should NOT retry
    Failed(ohno::AppError, Option<RateLimitInfo>),
}

/// Hosting API client
#[derive(Debug, Clone)]
#[expect(clippy::struct_field_names, reason = "client field stores the underlying HTTP client")]
pub struct Client {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
    timeout: Duration,
}

impl Client {
    /// Create a new hosting API client with optional authentication token and base URL
    pub fn new(token: Option<&str>, base_url: impl Into<String>, timeout: Duration, retry: RetryPolicy) -> crate::Result<Self> {
        use reqwest::header::AUTHORIZATION;

        let mut client_builder = reqwest::Client::builder().user_agent("repo-pulse");

        if let Some(t) = token {
            let mut auth_val = HeaderValue::from_str(&format!("token {t}"))?;
            auth_val.set_sensitive(true);

            let mut headers = HeaderMap::new();
            let _ = headers.insert(AUTHORIZATION, auth_val);

            client_builder = client_builder.default_headers(headers);
        }

        let base_url: String = base_url.into();
        Ok(Self {
            client: client_builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
            timeout,
        })
    }

    /// Get the base URL for this client
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make an API call and classify the result
    ///
    /// `accept` overrides the default media type, e.g. to get timestamps from the stargazers listing.
    pub async fn api_call(&self, url: &str, accept: Option<&'static str>) -> HostingApiResult<reqwest::Response> {
        let mut headers = HeaderMap::new();
        if let Some(accept) = accept {
            let _ = headers.insert(ACCEPT, HeaderValue::from_static(accept));
        }

        let resp = match resilient_get(&self.client, url, headers, self.retry, self.timeout).await {
            Ok(r) => r,
            Err(e) => return HostingApiResult::Failed(e, None),
        };

        // Extract rate limit info from response headers before checking status
        let rate_limit = extract_rate_limit_from_headers(resp.headers());

        let status = resp.status();
        if status.is_success() {
            return HostingApiResult::Success(resp, rate_limit);
        }

        let status_code = status.as_u16();

        // a 403 with quota left is a permission problem, e.g. traffic on a repository we can't push to
        let quota_exhausted = rate_limit.as_ref().is_none_or(|rl| rl.remaining == 0);
        if status_code == 429 || (status_code == 403 && quota_exhausted) {
            // No headers means no reset time; assume the usual one-hour window
            let rate_limit = rate_limit.unwrap_or_else(|| RateLimitInfo {
                remaining: 0,
                reset_at: Utc::now() + chrono::Duration::hours(1),
            });
            return HostingApiResult::RateLimited(rate_limit);
        }

        if status_code == 404 {
            return HostingApiResult::NotFound(rate_limit);
        }

        let error = match resp.error_for_status() {
            Err(e) => e.into(),
            Ok(resp) => ohno::app_err!("unexpected HTTP status {} from {url}", resp.status()),
        };
        HostingApiResult::Failed(error, rate_limit)
    }
}

/// Extract rate limit information from API response headers
fn extract_rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let remaining = headers.get("x-ratelimit-remaining")?.to_str().ok()?.parse::<usize>().ok()?;

    let reset_timestamp = headers.get("x-ratelimit-reset")?.to_str().ok()?.parse::<i64>().ok()?;

    let reset_at = DateTime::from_timestamp(reset_timestamp, 0)?;

    Some(RateLimitInfo { remaining, reset_at })
}
