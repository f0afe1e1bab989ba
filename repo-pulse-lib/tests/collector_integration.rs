//! End-to-end collection against a mock GitHub API.
//!
//! The mock serves one repository with a partial stargazer listing, a few contributors,
//! clone traffic, and a forbidden views endpoint, which is what an unprivileged token sees.

use chrono::{DateTime, Utc};
use core::time::Duration;
use repo_pulse_lib::facts::{Collector, FetchOutcome, HostingOptions, RepoReport, RepoSpec, RetryPolicy};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STAR_TOTAL: u64 = 42;
const FORK_TOTAL: u64 = 5;

fn now() -> DateTime<Utc> {
    "2024-06-15T00:00:00Z".parse().unwrap()
}

fn collector(server: &MockServer, seed: u64) -> Collector {
    let options = HostingOptions {
        api_base_url: server.uri(),
        retry: RetryPolicy {
            max_retry_attempts: 0,
            base_delay: Duration::from_millis(1),
        },
        ..HostingOptions::default()
    };
    Collector::new(Some("test-token"), options, Some(seed)).unwrap()
}

async fn mount_github(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/repos/acme/widget"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "widget",
            "full_name": "acme/widget",
            "description": "A React component library",
            "language": "TypeScript",
            "fork": false,
            "stargazers_count": STAR_TOTAL,
            "forks_count": FORK_TOTAL,
            "watchers_count": STAR_TOTAL,
            "open_issues_count": 3,
            "size": 2048,
            "created_at": "2024-03-10T12:00:00Z",
            "updated_at": "2024-06-14T08:00:00Z",
            "pushed_at": "2024-06-14T08:00:00Z"
        })))
        .mount(server)
        .await;

    let stars: Vec<_> = (1..=12)
        .map(|day| serde_json::json!({ "starred_at": format!("2024-06-{day:02}T10:00:00Z"), "user": { "login": "someone" } }))
        .chain([serde_json::json!({ "starred_at": "not a timestamp" })])
        .collect();

    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/stargazers"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stars))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/stargazers"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/contributors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "login": "raj-kumar", "contributions": 30 },
            { "login": "hans-mueller", "contributions": 10 },
            { "contributions": 2 }
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/languages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "TypeScript": 12000, "CSS": 800 })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/traffic/clones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "count": 14,
            "uniques": 3,
            "clones": [{ "timestamp": "2024-06-10T00:00:00Z", "count": 14, "uniques": 3 }]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/traffic/views"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "4000")
                .insert_header("x-ratelimit-reset", "1718409600")
                .set_body_json(serde_json::json!({ "message": "Must have push access to repository" })),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

async fn collect_widget(server: &MockServer, seed: u64) -> RepoReport {
    let spec: RepoSpec = "acme/widget".parse().unwrap();
    match collector(server, seed).collect(&spec, now()).await {
        FetchOutcome::Found(report) => report,
        FetchOutcome::NotFound => panic!("repository unexpectedly not found"),
        FetchOutcome::Error(e) => panic!("collection failed: {e:#}"),
    }
}

#[tokio::test]
async fn test_collect_builds_complete_report() {
    let server = MockServer::start().await;
    mount_github(&server).await;

    let report = collect_widget(&server, 11).await;

    assert_eq!(report.full_name, "acme/widget");
    assert_eq!(report.stars, STAR_TOTAL);
    assert_eq!(report.forks, FORK_TOTAL);
    assert_eq!(report.contributors_count, 3);
    assert_eq!(report.languages.get("TypeScript"), Some(&12000));
    assert_eq!(report.clones.count, 14);
    assert_eq!(report.views.count, 0);
    assert_eq!(report.timestamp, now());

    assert_eq!(report.classification.framework.to_string(), "React/Next.js");
    assert_eq!(report.classification.repo_type.to_string(), "Library");
    assert_eq!(report.classification.primary_language, "TypeScript");
}

#[tokio::test]
async fn test_collect_history_reconciles_with_totals() {
    let server = MockServer::start().await;
    mount_github(&server).await;

    let history = collect_widget(&server, 11).await.analytics.history;

    // March through June
    assert_eq!(history.len(), 4);
    assert_eq!(history.iter().map(|m| m.stars_gained).sum::<u64>(), STAR_TOTAL);
    assert_eq!(history.iter().map(|m| m.forks_gained).sum::<u64>(), FORK_TOTAL);
    assert_eq!(history.last().unwrap().total_stars_after, STAR_TOTAL);

    for month in &history {
        assert_eq!(month.total_stars_after, month.total_stars_before + month.stars_gained);
        assert_eq!(month.total_forks_after, month.total_forks_before + month.forks_gained);
    }
}

#[tokio::test]
async fn test_collect_daily_window_and_distribution() {
    let server = MockServer::start().await;
    mount_github(&server).await;

    let analytics = collect_widget(&server, 11).await.analytics;

    assert_eq!(analytics.daily.stars.len(), 31);
    assert_eq!(analytics.daily.forks.len(), 31);
    assert_eq!(analytics.daily.stars.last().unwrap().date, now().date_naive());

    for series in [&analytics.countries.stars, &analytics.countries.forks, &analytics.countries.clones] {
        assert!(series.len() <= 8);
        assert!(series.iter().all(|e| e.value > 0));
        assert!(series.windows(2).all(|w| w[0].value >= w[1].value));
    }
}

#[tokio::test]
async fn test_collect_is_reproducible_with_seed() {
    let server = MockServer::start().await;
    mount_github(&server).await;

    let first = collect_widget(&server, 2024).await;
    let second = collect_widget(&server, 2024).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_collect_missing_repository() {
    let server = MockServer::start().await;
    mount_github(&server).await;

    let spec: RepoSpec = "https://github.com/acme/ghost".parse().unwrap();
    assert!(matches!(collector(&server, 1).collect(&spec, now()).await, FetchOutcome::NotFound));
}

#[tokio::test]
async fn test_trending_searches_recent_window() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .and(query_param("q", "created:>2023-06-16"))
        .and(query_param("sort", "stars"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "total_count": 1, "items": [{ "full_name": "acme/widget" }] })))
        .expect(1)
        .mount(&server)
        .await;

    let trending = collector(&server, 1).trending(now()).await.unwrap();
    assert_eq!(trending["items"][0]["full_name"], "acme/widget");
}
