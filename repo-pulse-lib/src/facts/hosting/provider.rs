use super::client::{Client, Contributor, HostingApiResult, RateLimitInfo, Repository, Stargazer, TrafficKind, TrafficSummary};
use crate::Result;
use crate::facts::FetchOutcome;
use crate::facts::RepoSpec;
use crate::facts::resilient_http::RetryPolicy;
use crate::facts::throttler::Throttler;
use chrono::{DateTime, Utc};
use core::time::Duration;
use ohno::EnrichableExt;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;

const LOG_TARGET: &str = "   hosting";
const STAR_PAGE_SIZE: u8 = 100;
const CONTRIBUTOR_PAGE_SIZE: u8 = 100;
const TRENDING_PAGE_SIZE: u8 = 10;
const MAX_RATE_LIMIT_WAIT_SECS: i64 = 3600;
const STAR_MEDIA_TYPE: &str = "application/vnd.github.v3.star+json";

/// Macro to unwrap `HostingApiResult` or propagate rate limit/error
macro_rules! unwrap_or_return {
    ($expr:expr) => {
        match $expr {
            HostingApiResult::Success(data, rate_limit) => (data, rate_limit),
            HostingApiResult::RateLimited(rate_limit) => return HostingApiResult::RateLimited(rate_limit),
            HostingApiResult::NotFound(rate_limit) => return HostingApiResult::NotFound(rate_limit),
            HostingApiResult::Failed(e, rate_limit) => return HostingApiResult::Failed(e, rate_limit),
        }
    };
}

/// Connection and pagination settings for the hosting provider.
#[derive(Debug, Clone)]
pub struct HostingOptions {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub max_concurrent_requests: usize,
    pub max_star_events: usize,
    pub max_star_pages: u32,
    pub trending_window_days: u32,
}

impl Default for HostingOptions {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.github.com".to_string(),
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            max_concurrent_requests: 5,
            max_star_events: 2000,
            max_star_pages: 20,
            trending_window_days: 365,
        }
    }
}

/// Fetches repository documents from the GitHub REST API.
///
/// Only the core repository lookup reports failures to the caller. The auxiliary
/// documents are best-effort and resolve to empty values when they cannot be fetched.
#[derive(Debug, Clone)]
pub struct Provider {
    client: Client,
    throttler: Arc<Throttler>,
    options: HostingOptions,
}

impl Provider {
    pub fn new(github_token: Option<&str>, options: HostingOptions) -> Result<Self> {
        let client = Client::new(github_token, options.api_base_url.as_str(), options.request_timeout, options.retry)?;

        Ok(Self {
            client,
            throttler: Arc::new(Throttler::new(options.max_concurrent_requests)),
            options,
        })
    }

    /// Fetch the repository's core metadata.
    pub async fn fetch_repository(&self, repo_spec: &RepoSpec) -> FetchOutcome<Repository> {
        log::info!(target: LOG_TARGET, "Querying GitHub for information on repository '{repo_spec}'");

        let url = self.repo_url(repo_spec, "");
        match self.get_json::<Repository>(&url, None).await {
            HostingApiResult::Success(repo, _) => FetchOutcome::Found(repo),
            HostingApiResult::NotFound(_) => FetchOutcome::NotFound,
            HostingApiResult::RateLimited(rl) => FetchOutcome::Error(Arc::new(rate_limited_error(&rl))),
            HostingApiResult::Failed(e, _) => {
                FetchOutcome::Error(Arc::new(e.enrich_with(|| format!("fetching core info for repository '{repo_spec}'"))))
            }
        }
    }

    /// Fetch timestamped star events, one page at a time.
    ///
    /// Stops at the configured event or page cap, at the first empty page, or at the first
    /// failure. Whatever was collected before stopping is returned.
    pub async fn fetch_star_events(&self, repo_spec: &RepoSpec) -> Vec<Stargazer> {
        let max_events = self.options.max_star_events;
        let mut stargazers = Vec::new();
        let mut page_num = 1u32;

        while stargazers.len() < max_events && page_num <= self.options.max_star_pages {
            let url = self.repo_url(repo_spec, &format!("/stargazers?per_page={STAR_PAGE_SIZE}&page={page_num}"));

            let page: Vec<Stargazer> = match self.get_json(&url, Some(STAR_MEDIA_TYPE)).await {
                HostingApiResult::Success(page, _) => page,
                HostingApiResult::NotFound(_) => break,
                HostingApiResult::RateLimited(rl) => {
                    log::warn!(target: LOG_TARGET, "Stopped listing stargazers for '{repo_spec}': {}", rate_limited_error(&rl));
                    break;
                }
                HostingApiResult::Failed(e, _) => {
                    log::warn!(target: LOG_TARGET, "Stopped listing stargazers for '{repo_spec}' at page {page_num}: {e:#}");
                    break;
                }
            };

            if page.is_empty() {
                break;
            }

            stargazers.extend(page);
            page_num += 1;
        }

        stargazers.truncate(max_events);
        log::debug!(target: LOG_TARGET, "Collected {} star event(s) for '{repo_spec}' over {} page(s)", stargazers.len(), page_num - 1);

        stargazers
    }

    /// Fetch the first page of contributors.
    pub async fn fetch_contributors(&self, repo_spec: &RepoSpec) -> Vec<Contributor> {
        let url = self.repo_url(repo_spec, &format!("/contributors?per_page={CONTRIBUTOR_PAGE_SIZE}"));
        self.get_json_or_default(&url, repo_spec, "contributors").await
    }

    /// Fetch the byte count of each language used in the repository.
    pub async fn fetch_languages(&self, repo_spec: &RepoSpec) -> BTreeMap<String, u64> {
        let url = self.repo_url(repo_spec, "/languages");
        self.get_json_or_default(&url, repo_spec, "languages").await
    }

    /// Fetch clone or view traffic. Requires push access, so this commonly resolves to zero.
    pub async fn fetch_traffic(&self, repo_spec: &RepoSpec, kind: TrafficKind) -> TrafficSummary {
        let url = self.repo_url(repo_spec, &format!("/traffic/{kind}"));
        self.get_json_or_default(&url, repo_spec, &format!("{kind} traffic")).await
    }

    /// Search for the most-starred repositories created within the trending window.
    pub async fn fetch_trending(&self, now: DateTime<Utc>) -> Result<serde_json::Value> {
        let since = (now - chrono::Duration::days(i64::from(self.options.trending_window_days))).format("%Y-%m-%d");
        let url = format!(
            "{}/search/repositories?q=created:>{since}&sort=stars&order=desc&per_page={TRENDING_PAGE_SIZE}",
            self.client.base_url()
        );

        log::info!(target: LOG_TARGET, "Querying GitHub for repositories created since {since}");

        match self.get_json::<serde_json::Value>(&url, None).await {
            HostingApiResult::Success(value, _) => Ok(value),
            HostingApiResult::NotFound(_) => Err(ohno::app_err!("repository search is unavailable")),
            HostingApiResult::RateLimited(rl) => Err(rate_limited_error(&rl)),
            HostingApiResult::Failed(e, _) => Err(e.enrich_with(|| "searching trending repositories".to_string())),
        }
    }

    /// Construct API URL for a repository with optional path suffix
    fn repo_url(&self, repo_spec: &RepoSpec, suffix: &str) -> String {
        format!("{}/repos/{}/{}{suffix}", self.client.base_url(), repo_spec.owner(), repo_spec.repo())
    }

    async fn get_json_or_default<T: DeserializeOwned + Default>(&self, url: &str, repo_spec: &RepoSpec, what: &str) -> T {
        match self.get_json(url, None).await {
            HostingApiResult::Success(value, _) => value,
            HostingApiResult::NotFound(_) => {
                log::debug!(target: LOG_TARGET, "No {what} available for '{repo_spec}'");
                T::default()
            }
            HostingApiResult::RateLimited(rl) => {
                log::warn!(target: LOG_TARGET, "Could not fetch {what} for '{repo_spec}': {}", rate_limited_error(&rl));
                T::default()
            }
            HostingApiResult::Failed(e, _) => {
                log::warn!(target: LOG_TARGET, "Could not fetch {what} for '{repo_spec}': {e:#}");
                T::default()
            }
        }
    }

    /// Issue one throttled request and decode the body.
    ///
    /// A rate-limited response pauses the throttler until the limit resets, so that
    /// concurrent requests stop hammering the API.
    async fn get_json<T: DeserializeOwned>(&self, url: &str, accept: Option<&'static str>) -> HostingApiResult<T> {
        if self.throttler.is_paused() {
            log::debug!(target: LOG_TARGET, "Waiting for the rate limit to reset before GET {url}");
        }

        let _permit = match self.throttler.acquire().await {
            Ok(permit) => permit,
            Err(e) => return HostingApiResult::Failed(e, None),
        };

        let result = self.client.api_call(url, accept).await;
        if let HostingApiResult::RateLimited(rl) = &result {
            self.pause_until_reset(rl);
        }

        let (resp, rate_limit) = unwrap_or_return!(result);
        match resp.json().await {
            Ok(value) => HostingApiResult::Success(value, rate_limit),
            Err(e) => HostingApiResult::Failed(e.into(), rate_limit),
        }
    }

    fn pause_until_reset(&self, rate_limit: &RateLimitInfo) {
        let now = Utc::now();
        let wait_until = rate_limit.reset_at.min(now + chrono::Duration::seconds(MAX_RATE_LIMIT_WAIT_SECS));

        if wait_until > now {
            let wait_duration = (wait_until - now).to_std().unwrap_or(Duration::ZERO);
            if self.throttler.pause_for(wait_duration) {
                log::warn!(
                    target: LOG_TARGET,
                    "Hit GitHub rate limit, holding requests until {}",
                    wait_until.with_timezone(&chrono::Local).format("%T")
                );
            }
        }
    }
}

fn rate_limited_error(rate_limit: &RateLimitInfo) -> ohno::AppError {
    ohno::app_err!("GitHub API rate limit exceeded; resets at {}", rate_limit.reset_at.format("%Y-%m-%d %H:%M:%S UTC"))
}
