//! Geographic breakdown of stars, forks and clones.
//!
//! The hosting API exposes no location data for stargazers, so the breakdown is estimated:
//! contributor logins are bucketed into regions through a keyword table and weighted by
//! contribution count. Repositories without usable contributor data fall back to a fixed
//! share table.

use super::inputs::{ContributorRecord, RepositorySnapshot};
use serde::{Deserialize, Serialize};

const LOG_TARGET: &str = " analytics";

/// Only the first contributors reported by the API are considered.
const MAX_CONTRIBUTORS: usize = 50;

/// Number of entries kept per metric.
pub const MAX_ENTRIES: usize = 8;

/// Clone estimates are scaled from region weight by this factor.
const CLONES_PER_WEIGHT: u64 = 10;

const DEFAULT_REGION: &str = "United States";

/// Login keyword table; the first row containing a matching substring wins.
const REGION_KEYWORDS: &[(&[&str], &str)] = &[
    (&["de", "german"], "Germany"),
    (&["uk", "brit"], "United Kingdom"),
    (&["ca", "canadian"], "Canada"),
    (&["fr", "french"], "France"),
    (&["jp", "japan"], "Japan"),
    (&["au", "aussie"], "Australia"),
    (&["in", "indian"], "India"),
    (&["br", "brazil"], "Brazil"),
];

/// Shares used when contributor data gives no signal.
const FALLBACK_SHARES: &[(&str, f64)] = &[
    ("United States", 0.35),
    ("Germany", 0.12),
    ("United Kingdom", 0.10),
    ("Canada", 0.08),
    ("France", 0.07),
    ("Japan", 0.06),
    ("Australia", 0.05),
    ("India", 0.04),
    ("Brazil", 0.04),
    ("Netherlands", 0.03),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionEntry {
    pub country: String,
    pub value: u64,
}

/// Ranked per-region estimates for each metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Distribution {
    pub stars: Vec<DistributionEntry>,
    pub forks: Vec<DistributionEntry>,
    pub clones: Vec<DistributionEntry>,
}

/// Map a contributor login to a region label.
#[must_use]
pub fn region_for_login(login: &str) -> &'static str {
    let login = login.to_lowercase();
    REGION_KEYWORDS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| login.contains(k)))
        .map_or(DEFAULT_REGION, |&(_, region)| region)
}

/// Estimate the regional distribution of a repository's audience.
#[must_use]
#[expect(clippy::cast_precision_loss, reason = "counts are far below 2^52")]
#[expect(clippy::cast_possible_truncation, reason = "floored non-negative values")]
#[expect(clippy::cast_sign_loss, reason = "floored non-negative values")]
pub fn estimate_distribution(repo: &RepositorySnapshot, contributors: &[ContributorRecord]) -> Distribution {
    let mut weights = contributor_weights(contributors);
    if weights.iter().all(|(_, w)| *w == 0) {
        log::debug!(target: LOG_TARGET, "No contributor signal for '{}', using fallback region shares", repo.full_name);
        weights = fallback_weights(repo.stars);
    }

    let total_weight: u64 = weights.iter().map(|(_, w)| w).sum();
    if total_weight == 0 {
        return Distribution::default();
    }

    let mut distribution = Distribution::default();
    for (region, weight) in weights {
        let ratio = weight as f64 / total_weight as f64;
        let stars = (repo.stars as f64 * ratio).floor() as u64;
        let forks = (repo.forks as f64 * ratio).floor() as u64;
        let clones = weight.saturating_mul(CLONES_PER_WEIGHT);

        push_nonzero(&mut distribution.stars, region, stars);
        push_nonzero(&mut distribution.forks, region, forks);
        push_nonzero(&mut distribution.clones, region, clones);
    }

    rank(&mut distribution.stars);
    rank(&mut distribution.forks);
    rank(&mut distribution.clones);

    distribution
}

/// Region weights in first-seen order.
fn contributor_weights(contributors: &[ContributorRecord]) -> Vec<(&'static str, u64)> {
    let mut weights: Vec<(&'static str, u64)> = Vec::new();
    for contributor in contributors.iter().take(MAX_CONTRIBUTORS) {
        let region = region_for_login(&contributor.login);
        match weights.iter_mut().find(|(r, _)| *r == region) {
            Some((_, w)) => *w += contributor.contributions,
            None => weights.push((region, contributor.contributions)),
        }
    }

    weights
}

#[expect(clippy::cast_precision_loss, reason = "counts are far below 2^52")]
#[expect(clippy::cast_possible_truncation, reason = "floored non-negative values")]
#[expect(clippy::cast_sign_loss, reason = "floored non-negative values")]
fn fallback_weights(total_stars: u64) -> Vec<(&'static str, u64)> {
    FALLBACK_SHARES
        .iter()
        .map(|(region, share)| (*region, (total_stars as f64 * share).floor() as u64))
        .filter(|(_, w)| *w > 0)
        .collect()
}

fn push_nonzero(entries: &mut Vec<DistributionEntry>, region: &str, value: u64) {
    if value > 0 {
        entries.push(DistributionEntry {
            country: region.to_string(),
            value,
        });
    }
}

fn rank(entries: &mut Vec<DistributionEntry>) {
    // stable, so equal values keep first-seen order
    entries.sort_by(|a, b| b.value.cmp(&a.value));
    entries.truncate(MAX_ENTRIES);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn repo(stars: u64, forks: u64) -> RepositorySnapshot {
        RepositorySnapshot {
            name: "widget".to_string(),
            full_name: "acme/widget".to_string(),
            description: None,
            language: None,
            fork: false,
            created_at: DateTime::parse_from_rfc3339("2020-01-01T00:00:00Z").unwrap().to_utc(),
            stars,
            forks,
            size: 0,
            open_issues: 0,
        }
    }

    fn assert_ranked(entries: &[DistributionEntry]) {
        assert!(entries.len() <= MAX_ENTRIES);
        assert!(entries.iter().all(|e| e.value > 0));
        assert!(entries.windows(2).all(|w| w[0].value >= w[1].value));
    }

    #[test]
    fn test_region_for_login() {
        assert_eq!(region_for_login("HeinzDev"), "Germany");
        assert_eq!(region_for_login("brit-smith"), "United Kingdom");
        assert_eq!(region_for_login("jpsmith"), "Japan");
        assert_eq!(region_for_login("xyz"), "United States");
        // first row wins even when a later row also matches
        assert_eq!(region_for_login("indie-dev"), "Germany");
    }

    #[test]
    fn test_contributor_weighting() {
        let contributors = [
            ContributorRecord::new("dev-one", 30),
            ContributorRecord::new("xyz", 10),
        ];
        let dist = estimate_distribution(&repo(1000, 100), &contributors);

        assert_eq!(
            dist.stars,
            vec![
                DistributionEntry { country: "Germany".to_string(), value: 750 },
                DistributionEntry { country: "United States".to_string(), value: 250 },
            ]
        );
        assert_eq!(dist.forks[0].value, 75);
        assert_eq!(dist.clones[0].value, 300);
        assert_eq!(dist.clones[1].value, 100);
    }

    #[test]
    fn test_fallback_table_without_contributors() {
        let dist = estimate_distribution(&repo(1000, 200), &[]);

        assert_eq!(dist.stars.len(), MAX_ENTRIES);
        // weights sum to 940, so US gets floor(1000 * 350 / 940)
        assert_eq!(dist.stars[0], DistributionEntry { country: "United States".to_string(), value: 372 });
        assert_eq!(dist.stars[1].country, "Germany");
        // India and Brazil tie; stable ordering keeps India first
        assert_eq!(dist.stars[7].country, "India");
        assert_ranked(&dist.stars);
        assert_ranked(&dist.forks);
        assert_ranked(&dist.clones);
    }

    #[test]
    fn test_zero_weight_contributors_use_fallback() {
        let contributors = [ContributorRecord::new("dev", 0)];
        let dist = estimate_distribution(&repo(100, 0), &contributors);

        assert_eq!(dist.stars[0].country, "United States");
        assert!(dist.forks.is_empty());
    }

    #[test]
    fn test_only_first_fifty_contributors_count() {
        let mut contributors: Vec<_> = (0..50).map(|_| ContributorRecord::new("xyz", 1)).collect();
        contributors.push(ContributorRecord::new("german", 1000));

        let dist = estimate_distribution(&repo(500, 0), &contributors);
        assert_eq!(dist.stars.len(), 1);
        assert_eq!(dist.stars[0].country, "United States");
    }

    #[test]
    fn test_zero_star_repository_is_empty() {
        let dist = estimate_distribution(&repo(0, 0), &[]);
        assert_eq!(dist, Distribution::default());
    }

    #[test]
    fn test_many_regions_truncated() {
        let logins = ["xyz", "de", "uk", "ca", "fr", "jp", "au", "in", "br"];
        let contributors: Vec<_> = logins.iter().enumerate().map(|(i, l)| ContributorRecord::new(*l, 10 + i as u64)).collect();

        let dist = estimate_distribution(&repo(10_000, 1_000), &contributors);
        assert_ranked(&dist.stars);
        assert_eq!(dist.stars.len(), MAX_ENTRIES);
        assert_eq!(dist.stars[0].country, "Brazil");
        assert!(dist.stars.iter().all(|e| e.country != "United States"));
    }
}
