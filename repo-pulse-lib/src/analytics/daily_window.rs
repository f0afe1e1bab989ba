//! Day-by-day star and fork activity over the trailing 30 days.
//!
//! The window is presentation-oriented: unlike the monthly history it is not reconciled
//! against the authoritative totals.

use super::inputs::{RepositorySnapshot, StarEvent, valid_timestamps};
use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const LOG_TARGET: &str = " analytics";

/// Number of days before today covered by the window.
pub const WINDOW_DAYS: u64 = 30;

/// Below this many dated events the recorded timeline is considered too sparse to chart.
const MIN_REAL_EVENTS: usize = 10;

/// Extra weight per day of recency, so the most recent days trend upward.
const RECENCY_STEP: f64 = 0.02;

const WEEKDAY_FACTOR: f64 = 1.2;
const WEEKEND_FACTOR: f64 = 0.6;

/// Ceiling on forks as a fraction of stars for any single day.
const MAX_FORK_RATIO: f64 = 0.3;

/// No single modeled day may exceed this share (1/20) of all-time stars.
const MAX_DAILY_SHARE_DIVISOR: u64 = 20;

/// One day of activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub value: u64,

    /// Sum of `value` from the start of the window through this day
    pub cumulative: u64,
}

/// Daily star and fork series, oldest day first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DailyWindow {
    pub stars: Vec<DailyRecord>,
    pub forks: Vec<DailyRecord>,
}

/// Build the daily window ending on the day of `now`.
///
/// Always yields `WINDOW_DAYS + 1` records per series.
#[expect(clippy::cast_precision_loss, reason = "star counts are far below 2^52")]
#[expect(clippy::cast_possible_truncation, reason = "floored non-negative values")]
#[expect(clippy::cast_sign_loss, reason = "floored non-negative values")]
pub fn synthesize_daily_window<R: Rng + ?Sized>(
    repo: &RepositorySnapshot,
    events: &[StarEvent],
    now: DateTime<Utc>,
    rng: &mut R,
) -> DailyWindow {
    let today = now.date_naive();

    let mut real_counts: HashMap<NaiveDate, u64> = HashMap::new();
    let mut real_total = 0usize;
    for ts in valid_timestamps(events) {
        *real_counts.entry(ts.date_naive()).or_default() += 1;
        real_total += 1;
    }
    let use_real = real_total >= MIN_REAL_EVENTS;

    let repo_age_days = u64::try_from((now - repo.created_at).num_days()).unwrap_or(0).max(1);
    let lifetime_avg = repo.stars as f64 / repo_age_days as f64;
    let max_daily = (repo.stars / MAX_DAILY_SHARE_DIVISOR).max(1);
    let fork_ratio = (repo.forks as f64 / repo.stars.max(1) as f64).min(MAX_FORK_RATIO);

    log::debug!(
        target: LOG_TARGET,
        "Synthesizing daily window for '{}' from {}",
        repo.full_name,
        if use_real { "recorded events" } else { "the lifetime rate" }
    );

    let mut window = DailyWindow {
        stars: Vec::with_capacity(WINDOW_DAYS as usize + 1),
        forks: Vec::with_capacity(WINDOW_DAYS as usize + 1),
    };
    let mut cumulative_stars = 0u64;
    let mut cumulative_forks = 0u64;

    for days_ago in (0..=WINDOW_DAYS).rev() {
        let date = today.checked_sub_days(Days::new(days_ago)).unwrap_or(today);

        let stars = if use_real {
            real_counts.get(&date).copied().unwrap_or(0)
        } else {
            let recency_factor = 1.0 + (WINDOW_DAYS - days_ago) as f64 * RECENCY_STEP;
            let weekday_factor = if date.weekday().num_days_from_monday() < 5 {
                WEEKDAY_FACTOR
            } else {
                WEEKEND_FACTOR
            };
            let random_factor = rng.gen_range(0.7..=1.3);

            let modeled = (lifetime_avg * recency_factor * weekday_factor * random_factor).floor().max(0.0) as u64;
            modeled.min(max_daily)
        };

        let fork_noise = rng.gen_range(0.8..=1.2);
        let forks = (stars as f64 * fork_ratio * fork_noise).floor().max(0.0) as u64;

        cumulative_stars += stars;
        cumulative_forks += forks;

        window.stars.push(DailyRecord {
            date,
            value: stars,
            cumulative: cumulative_stars,
        });
        window.forks.push(DailyRecord {
            date,
            value: forks,
            cumulative: cumulative_forks,
        });
    }

    window
}
