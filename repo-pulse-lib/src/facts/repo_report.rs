use super::hosting::TrafficSummary;
use crate::analytics::{AnalyticsBundle, Classification};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything served for one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoReport {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub watchers: u64,
    pub open_issues: u64,
    pub size: u64,
    pub clones: TrafficSummary,
    pub views: TrafficSummary,
    pub contributors_count: usize,

    /// Bytes of code per language
    pub languages: BTreeMap<String, u64>,

    pub classification: Classification,
    pub analytics: AnalyticsBundle,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,

    /// When this report was generated
    pub timestamp: DateTime<Utc>,
}
