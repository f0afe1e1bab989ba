use super::hosting::{HostingOptions, Provider, Repository, TrafficKind};
use super::{FetchOutcome, RepoReport, RepoSpec};
use crate::Result;
use crate::analytics::{self, ContributorRecord, RepositorySnapshot, StarEvent};
use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;

const LOG_TARGET: &str = " collector";

/// Gathers everything needed to build a [`RepoReport`] and runs the analytics engine over it
#[derive(Debug, Clone)]
pub struct Collector {
    hosting_provider: Provider,
    seed: Option<u64>,
}

impl Collector {
    /// Create a collector.
    ///
    /// When `seed` is set, every report is synthesized from a generator seeded with it, so
    /// repeated collections over the same upstream data produce identical output.
    pub fn new(github_token: Option<&str>, options: HostingOptions, seed: Option<u64>) -> Result<Self> {
        Ok(Self {
            hosting_provider: Provider::new(github_token, options)?,
            seed,
        })
    }

    /// Collect and synthesize the full report for one repository.
    pub async fn collect(&self, repo_spec: &RepoSpec, now: DateTime<Utc>) -> FetchOutcome<RepoReport> {
        let repo = match self.hosting_provider.fetch_repository(repo_spec).await {
            FetchOutcome::Found(repo) => repo,
            FetchOutcome::NotFound => {
                log::warn!(target: LOG_TARGET, "Repository '{repo_spec}' not found");
                return FetchOutcome::NotFound;
            }
            FetchOutcome::Error(e) => {
                log::error!(target: LOG_TARGET, "Could not fetch repository '{repo_spec}': {e:#}");
                return FetchOutcome::Error(e);
            }
        };

        let p = &self.hosting_provider;
        let (stargazers, contributors, languages, clones, views) = tokio::join!(
            p.fetch_star_events(repo_spec),
            p.fetch_contributors(repo_spec),
            p.fetch_languages(repo_spec),
            p.fetch_traffic(repo_spec, TrafficKind::Clones),
            p.fetch_traffic(repo_spec, TrafficKind::Views),
        );

        let snapshot = snapshot_of(&repo);
        let star_events: Vec<_> = stargazers.iter().map(|s| StarEvent::parse(s.starred_at.as_deref())).collect();
        let contributor_records: Vec<_> = contributors
            .iter()
            .map(|c| ContributorRecord::new(c.login.clone().unwrap_or_default(), c.contributions))
            .collect();

        let mut rng = self.seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let classification = analytics::classify(&snapshot);
        let analytics = analytics::synthesize(&snapshot, &star_events, &contributor_records, now, &mut rng);

        log::info!(
            target: LOG_TARGET,
            "Built report for '{repo_spec}': {} stars, {} months of history, {} star event(s), {} contributor(s)",
            repo.stargazers_count,
            analytics.history.len(),
            star_events.len(),
            contributor_records.len()
        );

        FetchOutcome::Found(RepoReport {
            name: repo.name,
            full_name: repo.full_name,
            description: repo.description,
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            watchers: repo.watchers_count,
            open_issues: repo.open_issues_count,
            size: repo.size,
            clones,
            views,
            contributors_count: contributors.len(),
            languages,
            classification,
            analytics,
            created_at: repo.created_at,
            updated_at: repo.updated_at,
            pushed_at: repo.pushed_at,
            timestamp: now,
        })
    }

    /// Most-starred recently created repositories, as returned by the search API.
    pub async fn trending(&self, now: DateTime<Utc>) -> Result<serde_json::Value> {
        self.hosting_provider.fetch_trending(now).await
    }
}

fn snapshot_of(repo: &Repository) -> RepositorySnapshot {
    RepositorySnapshot {
        name: repo.name.clone(),
        full_name: repo.full_name.clone(),
        description: repo.description.clone(),
        language: repo.language.clone(),
        fork: repo.fork,
        created_at: repo.created_at,
        stars: repo.stargazers_count,
        forks: repo.forks_count,
        size: repo.size,
        open_issues: repo.open_issues_count,
    }
}
