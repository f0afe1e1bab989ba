//! Phased adoption curve used when event-level history is incomplete.
//!
//! The curve maps elapsed lifetime (normalized to `[0, 1]`) to the fraction of today's
//! stars that should plausibly have accrued by then: a slow start, an accelerating
//! growth phase, and a steady linear maturity phase.

/// End of the early phase, as a fraction of lifetime.
const EARLY_PHASE_END: f64 = 0.2;

/// End of the growth phase, as a fraction of lifetime.
const GROWTH_PHASE_END: f64 = 0.6;

/// Fraction of total stars accrued by the end of the early phase.
const EARLY_PHASE_SHARE: f64 = 0.05;

/// Fraction of total stars accrued by the end of the growth phase.
const GROWTH_PHASE_SHARE: f64 = 0.40;

/// Exponent shaping the acceleration in the growth phase.
const GROWTH_EXPONENT: f64 = 1.5;

/// Cumulative fraction of the final total expected at `progress` through the lifetime.
///
/// `progress` is clamped to `[0, 1]` and NaN is treated as zero. The result is
/// non-decreasing in `progress` and always lies in `[0, 1]`.
#[must_use]
pub fn cumulative_fraction(progress: f64) -> f64 {
    let p = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };

    let fraction = if p <= EARLY_PHASE_END {
        p * (EARLY_PHASE_SHARE / EARLY_PHASE_END)
    } else if p <= GROWTH_PHASE_END {
        let g = (p - EARLY_PHASE_END) / (GROWTH_PHASE_END - EARLY_PHASE_END);
        EARLY_PHASE_SHARE + g.powf(GROWTH_EXPONENT) * (GROWTH_PHASE_SHARE - EARLY_PHASE_SHARE)
    } else {
        let m = (p - GROWTH_PHASE_END) / (1.0 - GROWTH_PHASE_END);
        GROWTH_PHASE_SHARE + m * (1.0 - GROWTH_PHASE_SHARE)
    };

    fraction.clamp(0.0, 1.0)
}
