/// Rainfall accumulation over hourly forecast series.
///
/// A series mixes history and forecast. "Now" is the last observation at
/// or before the evaluation instant; everything after it is forecast. The
/// trailing accumulation at index `i` sums precipitation over the `window`
/// observations ending at and including `i`. It is `None` while the window
/// is not yet full, or when any hour inside it has no precipitation value,
/// so a gap is never silently treated as a dry hour.

use chrono::{DateTime, Utc};

use crate::alert::thresholds::{climate_threat, ClimateThreat};
use crate::model::HourlySeries;

/// Index of the last observation at or before `now`.
///
/// Returns `None` when the series is empty or starts after `now`.
pub fn now_index(series: &HourlySeries, now: DateTime<Utc>) -> Option<usize> {
    // Observations are sorted, so the insertion point of `now` splits
    // history from forecast.
    let split = series.observations.partition_point(|obs| obs.time <= now);
    split.checked_sub(1)
}

/// Trailing precipitation sum over `window` observations ending at `index`.
pub fn accumulation_at(series: &HourlySeries, index: usize, window: usize) -> Option<f64> {
    if window == 0 || index >= series.len() || index + 1 < window {
        return None;
    }

    series.observations[index + 1 - window..=index]
        .iter()
        .map(|obs| obs.precipitation_mm)
        .sum()
}

/// Number of consecutive hours with a precipitation value ending at `index`,
/// capped at `window`. Used to report how much history was usable when an
/// accumulation cannot be formed.
pub fn complete_hours_at(series: &HourlySeries, index: usize, window: usize) -> usize {
    if index >= series.len() {
        return 0;
    }

    series.observations[..=index]
        .iter()
        .rev()
        .take(window)
        .take_while(|obs| obs.precipitation_mm.is_some())
        .count()
}

/// Trailing accumulation at every observation.
pub fn rolling_sum(series: &HourlySeries, window: usize) -> Vec<Option<f64>> {
    (0..series.len())
        .map(|i| accumulation_at(series, i, window))
        .collect()
}

/// Climatic threat at every observation, from the rolling accumulation and
/// that hour's soil moisture. `None` where the accumulation is undefined.
pub fn hourly_threats(series: &HourlySeries, window: usize) -> Vec<Option<ClimateThreat>> {
    rolling_sum(series, window)
        .into_iter()
        .zip(&series.observations)
        .map(|(rain, obs)| rain.map(|r| climate_threat(r, obs.soil_moisture)))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
