//! Data collection from the hosting service
//!
//! This module gathers the raw material the analytics engine works from: repository
//! metadata, the stargazer timeline, contributors, languages, and traffic.
//!
//! # Implementation Model
//!
//! The [`Collector`] fetches the core repository document first. If that fails, the
//! whole collection fails with a [`FetchOutcome`] of `NotFound` or `Error`. Otherwise the
//! remaining documents are fetched concurrently and each resolves to an empty fallback
//! on failure, so a report can still be produced from partial data.
//!
//! Requests go through a shared throttler that bounds concurrency and pauses all traffic
//! when the API reports a rate limit. Transient network and server errors are retried
//! with exponential backoff.

mod collector;
mod fetch_outcome;
pub mod hosting;
mod repo_report;
mod repo_spec;
pub(crate) mod resilient_http;
mod throttler;

pub use collector::Collector;
pub use fetch_outcome::FetchOutcome;
pub use hosting::HostingOptions;
pub use repo_report::RepoReport;
pub use repo_spec::RepoSpec;
pub use resilient_http::RetryPolicy;
