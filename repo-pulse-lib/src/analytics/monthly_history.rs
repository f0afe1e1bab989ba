//! Month-by-month star and fork history from repository creation to now.
//!
//! When the fetched star events cover the repository's complete history, each month
//! carries its real star count. Otherwise months are shaped by the growth model with
//! some noise and a seasonal boost. Either way the series is then reconciled so that
//! it sums exactly to the authoritative totals.

use super::growth_model::cumulative_fraction;
use super::inputs::{RepositorySnapshot, StarEvent, valid_timestamps};
use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const LOG_TARGET: &str = " analytics";

/// Maximum relative deviation from the authoritative total that is corrected on the final month alone.
const RECONCILE_TOLERANCE: f64 = 0.05;

/// Number of trailing months that absorb a large reconciliation remainder.
const RECONCILE_SPAN: usize = 3;

/// Month-to-month noise amplitude (+/- 30%).
const MONTHLY_VARIATION: f64 = 0.6;

/// Multiplier applied to months that are historically busier.
const SEASONAL_BOOST: f64 = 1.1;

/// Months (1-based) that receive [`SEASONAL_BOOST`].
const SEASONAL_MONTHS: [u32; 5] = [3, 4, 9, 10, 11];

/// Star and fork activity for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyRecord {
    /// Display label, e.g. `Jan 2023`
    pub month: String,

    /// Sortable key, e.g. `2023-01`
    pub month_key: String,

    pub stars_gained: u64,
    pub forks_gained: u64,
    pub total_stars_before: u64,
    pub total_stars_after: u64,
    pub total_forks_before: u64,
    pub total_forks_after: u64,

    /// Midnight UTC on the first day of the month
    pub date: DateTime<Utc>,
}

/// Build the full monthly history for `repo` as of `now`.
///
/// The returned sequence has one entry per calendar month from the creation month
/// through the month of `now`, and the last entry's cumulative totals equal the
/// repository's current star and fork counts.
#[expect(clippy::cast_precision_loss, reason = "star counts are far below 2^52")]
#[expect(clippy::cast_possible_truncation, reason = "floored non-negative values")]
#[expect(clippy::cast_sign_loss, reason = "floored non-negative values")]
pub fn synthesize_monthly_history<R: Rng + ?Sized>(
    repo: &RepositorySnapshot,
    events: &[StarEvent],
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<MonthlyRecord> {
    let current = first_of_month(now.date_naive());
    let Some(current) = current else {
        return Vec::new();
    };
    let first = first_of_month(repo.created_at.date_naive()).map_or(current, |m| m.min(current));

    let total_months = months_between(first, current).max(1);

    let mut real_counts: HashMap<(i32, u32), u64> = HashMap::new();
    let mut real_total = 0u64;
    for ts in valid_timestamps(events) {
        *real_counts.entry((ts.year(), ts.month())).or_default() += 1;
        real_total += 1;
    }

    let use_real = repo.stars > 0 && real_total >= repo.stars;

    let fork_ratio = repo.forks as f64 / repo.stars.max(1) as f64;
    let mut records = Vec::new();
    let mut cumulative_stars = 0u64;
    let mut cumulative_forks = 0u64;

    let months = core::iter::successors(Some(first), |m| m.checked_add_months(Months::new(1)).filter(|next| *next <= current));
    for (index, month) in months.enumerate() {
        let stars_gained = if use_real {
            real_counts.get(&(month.year(), month.month())).copied().unwrap_or(0)
        } else {
            let progress = index as f64 / total_months as f64;
            modeled_stars(repo.stars, progress, cumulative_stars, month.month(), rng)
        };

        let forks_gained = (stars_gained as f64 * fork_ratio).floor().max(0.0) as u64;

        records.push(MonthlyRecord {
            month: month.format("%b %Y").to_string(),
            month_key: month.format("%Y-%m").to_string(),
            stars_gained,
            forks_gained,
            total_stars_before: cumulative_stars,
            total_stars_after: cumulative_stars + stars_gained,
            total_forks_before: cumulative_forks,
            total_forks_after: cumulative_forks + forks_gained,
            date: month.and_time(NaiveTime::MIN).and_utc(),
        });

        cumulative_stars += stars_gained;
        cumulative_forks += forks_gained;
    }

    log::debug!(
        target: LOG_TARGET,
        "Synthesized {} month(s) for '{}' from {} ({real_total} real star event(s))",
        records.len(),
        repo.full_name,
        if use_real { "recorded events" } else { "the growth model" }
    );

    reconcile_history(&mut records, repo.stars, repo.forks);
    records
}

/// Stars gained in one month according to the growth model.
#[expect(clippy::cast_precision_loss, reason = "star counts are far below 2^52")]
#[expect(clippy::cast_possible_truncation, reason = "floored non-negative values")]
#[expect(clippy::cast_sign_loss, reason = "floored non-negative values")]
fn modeled_stars<R: Rng + ?Sized>(total_stars: u64, progress: f64, cumulative_so_far: u64, month_number: u32, rng: &mut R) -> u64 {
    let target = (total_stars as f64 * cumulative_fraction(progress)).floor() as u64;
    let mut stars = target.saturating_sub(cumulative_so_far);

    if stars > 0 {
        let variation = (stars as f64 * (rng.r#gen::<f64>() - 0.5) * MONTHLY_VARIATION).trunc() as i64;
        stars = stars.saturating_add_signed(variation);

        if SEASONAL_MONTHS.contains(&month_number) {
            stars = (stars as f64 * SEASONAL_BOOST).floor() as u64;
        }
    }

    stars
}

/// Force the star and fork gains to sum to the authoritative totals, then rebuild the
/// before/after fields in chronological order.
fn reconcile_history(records: &mut [MonthlyRecord], total_stars: u64, total_forks: u64) {
    let mut stars: Vec<u64> = records.iter().map(|r| r.stars_gained).collect();
    let mut forks: Vec<u64> = records.iter().map(|r| r.forks_gained).collect();

    reconcile(&mut stars, total_stars);
    reconcile(&mut forks, total_forks);

    let mut running_stars = 0;
    let mut running_forks = 0;
    for ((record, stars_gained), forks_gained) in records.iter_mut().zip(stars).zip(forks) {
        record.stars_gained = stars_gained;
        record.total_stars_before = running_stars;
        running_stars += stars_gained;
        record.total_stars_after = running_stars;

        record.forks_gained = forks_gained;
        record.total_forks_before = running_forks;
        running_forks += forks_gained;
        record.total_forks_after = running_forks;
    }
}

/// Adjust trailing `gains` so they sum to `authoritative`.
///
/// A remainder larger than [`RECONCILE_TOLERANCE`] of the total is shared evenly over the
/// last [`RECONCILE_SPAN`] entries, with the integer remainder on the final entry. A smaller
/// remainder goes to the final entry alone. Entries never go below zero: any deficit is
/// carried backwards to earlier entries.
#[expect(clippy::cast_precision_loss, reason = "star counts are far below 2^52")]
pub(crate) fn reconcile(gains: &mut [u64], authoritative: u64) {
    let Some(last) = gains.len().checked_sub(1) else {
        return;
    };

    let synthesized: u64 = gains.iter().sum();
    let diff = i128::from(authoritative) - i128::from(synthesized);
    if diff == 0 {
        return;
    }

    let span = if diff.unsigned_abs() as f64 > authoritative as f64 * RECONCILE_TOLERANCE {
        RECONCILE_SPAN.min(gains.len())
    } else {
        1
    };

    let span_len = i128::try_from(span).unwrap_or(1);
    let share = diff / span_len;
    let remainder = diff - share * span_len;

    let mut adjusted: Vec<i128> = gains.iter().map(|&g| i128::from(g)).collect();
    for value in &mut adjusted[last + 1 - span..] {
        *value += share;
    }
    adjusted[last] += remainder;

    let mut deficit = 0i128;
    for value in adjusted.iter_mut().rev() {
        *value -= deficit;
        deficit = (-*value).max(0);
        *value = (*value).max(0);
    }

    for (gain, value) in gains.iter_mut().zip(adjusted) {
        *gain = u64::try_from(value).unwrap_or(0);
    }
}

fn first_of_month(date: NaiveDate) -> Option<NaiveDate> {
    date.with_day(1)
}

/// Whole calendar months from `from` to `to` (zero when in the same month).
fn months_between(from: NaiveDate, to: NaiveDate) -> u32 {
    let months = (to.year() - from.year()) * 12 + i32::try_from(to.month()).unwrap_or(0) - i32::try_from(from.month()).unwrap_or(0);
    u32::try_from(months).unwrap_or(0)
}
