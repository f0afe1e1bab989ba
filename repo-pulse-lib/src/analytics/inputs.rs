//! Ground-truth inputs consumed by the synthesis engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const LOG_TARGET: &str = " analytics";

/// Point-in-time view of a repository, as reported by the hosting service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySnapshot {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub fork: bool,
    pub created_at: DateTime<Utc>,
    pub stars: u64,
    pub forks: u64,
    pub size: u64,
    pub open_issues: u64,
}

/// One star recorded against a repository.
///
/// The timestamp is absent when the hosting service did not report one, or when
/// the reported value could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StarEvent {
    pub starred_at: Option<DateTime<Utc>>,
}

impl StarEvent {
    #[must_use]
    pub const fn at(starred_at: DateTime<Utc>) -> Self {
        Self { starred_at: Some(starred_at) }
    }

    /// Build an event from the raw RFC 3339 timestamp reported by the API.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let starred_at = raw.and_then(|s| match DateTime::parse_from_rfc3339(s) {
            Ok(ts) => Some(ts.to_utc()),
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Ignoring unparseable star timestamp '{s}': {e}");
                None
            }
        });

        Self { starred_at }
    }
}

/// Iterate the timestamps of the events that carry one.
pub fn valid_timestamps(events: &[StarEvent]) -> impl Iterator<Item = DateTime<Utc>> + '_ {
    events.iter().filter_map(|e| e.starred_at)
}

/// A contributor and how many contributions they made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorRecord {
    pub login: String,
    pub contributions: u64,
}

impl ContributorRecord {
    #[must_use]
    pub fn new(login: impl Into<String>, contributions: u64) -> Self {
        Self {
            login: login.into(),
            contributions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_timestamp() {
        let event = StarEvent::parse(Some("2023-01-15T10:30:00Z"));
        assert_eq!(event.starred_at.unwrap().to_rfc3339(), "2023-01-15T10:30:00+00:00");
    }

    #[test]
    fn test_parse_offset_timestamp_is_normalized() {
        let event = StarEvent::parse(Some("2023-01-15T10:30:00+02:00"));
        assert_eq!(event.starred_at.unwrap().to_rfc3339(), "2023-01-15T08:30:00+00:00");
    }

    #[test]
    fn test_parse_garbage_is_absent() {
        assert_eq!(StarEvent::parse(Some("yesterday")), StarEvent::default());
        assert_eq!(StarEvent::parse(Some("")), StarEvent::default());
    }

    #[test]
    fn test_parse_missing_is_absent() {
        assert!(StarEvent::parse(None).starred_at.is_none());
    }

    #[test]
    fn test_valid_timestamps_skips_absent() {
        let events = [
            StarEvent::parse(Some("2023-01-15T10:30:00Z")),
            StarEvent::parse(None),
            StarEvent::parse(Some("not a date")),
            StarEvent::parse(Some("2023-02-01T00:00:00Z")),
        ];
        assert_eq!(valid_timestamps(&events).count(), 2);
    }
}
