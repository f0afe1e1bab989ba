//! Single-calendar-year view of stars, forks and clones.
//!
//! Events are bucketed by month name only, so stars from different years land in the same
//! bucket. The shape is kept for clients built against the original dashboard.

use super::inputs::{RepositorySnapshot, StarEvent, valid_timestamps};
use chrono::Datelike;
use serde::{Deserialize, Serialize};

const LOG_TARGET: &str = " analytics";

const MONTH_LABELS: [&str; 12] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];

/// Below this share of total stars, bucketed events are replaced with a ramp.
const MIN_EVENT_COVERAGE: f64 = 0.1;

/// Clone estimates are based on one clone per this many stars.
const STARS_PER_CLONE: u64 = 50;
const MIN_CLONE_BASE: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyValue {
    pub month: String,
    pub value: u64,
}

/// Twelve-entry series for each metric, January first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LegacyMonthly {
    pub stars: Vec<MonthlyValue>,
    pub forks: Vec<MonthlyValue>,
    pub clones: Vec<MonthlyValue>,
}

/// Build the legacy twelve-month view.
#[must_use]
#[expect(clippy::cast_precision_loss, reason = "counts are far below 2^52")]
pub fn aggregate_legacy_monthly(repo: &RepositorySnapshot, events: &[StarEvent]) -> LegacyMonthly {
    let mut star_buckets = [0u64; 12];
    let mut processed = 0u64;
    for ts in valid_timestamps(events) {
        star_buckets[ts.month0() as usize] += 1;
        processed += 1;
    }

    if (processed as f64) < repo.stars as f64 * MIN_EVENT_COVERAGE {
        log::debug!(
            target: LOG_TARGET,
            "Only {processed} of {} stars are dated for '{}', using a ramp for the yearly view",
            repo.stars,
            repo.full_name
        );

        let base = (repo.stars / 12).max(1);
        for (i, bucket) in star_buckets.iter_mut().enumerate() {
            *bucket = ramp(base, i);
        }
    }

    let fork_base = (repo.forks / 12).max(1);
    let clone_base = (repo.stars / STARS_PER_CLONE).max(MIN_CLONE_BASE);

    LegacyMonthly {
        stars: series(|i| star_buckets[i]),
        forks: series(|i| ramp(fork_base, i).min(repo.forks)),
        clones: series(|i| clone_ramp(clone_base, i)),
    }
}

fn series(value_for: impl Fn(usize) -> u64) -> Vec<MonthlyValue> {
    MONTH_LABELS
        .iter()
        .enumerate()
        .map(|(i, label)| MonthlyValue {
            month: (*label).to_string(),
            value: value_for(i),
        })
        .collect()
}

/// `floor(base * (0.5 + (i + 1) / 12))`
#[expect(clippy::cast_precision_loss, reason = "counts are far below 2^52")]
#[expect(clippy::cast_possible_truncation, reason = "floored non-negative values")]
#[expect(clippy::cast_sign_loss, reason = "floored non-negative values")]
fn ramp(base: u64, month_index: usize) -> u64 {
    let growth = (month_index + 1) as f64 / 12.0;
    (base as f64 * (0.5 + growth)).floor() as u64
}

/// `max(1, floor(base * (0.5 + i / 12 * 1.5)))`
#[expect(clippy::cast_precision_loss, reason = "counts are far below 2^52")]
#[expect(clippy::cast_possible_truncation, reason = "floored non-negative values")]
#[expect(clippy::cast_sign_loss, reason = "floored non-negative values")]
fn clone_ramp(base: u64, month_index: usize) -> u64 {
    let multiplier = 0.5 + month_index as f64 / 12.0 * 1.5;
    ((base as f64 * multiplier).floor() as u64).max(1)
}
