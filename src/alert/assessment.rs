//! Point assessment: series + point → alert.
//!
//! Locates the now boundary in a point's hourly series, forms the trailing
//! accumulation there, and runs the classifier. The forecast rows after
//! now are classified the same way to report the worst level expected
//! within the horizon. Nothing here is retained between evaluations.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use crate::alert::thresholds::{climate_threat, gate_alert, AlertLevel, ClimateThreat};
use crate::analysis::rainfall::{accumulation_at, complete_hours_at, now_index};
use crate::ingest::ForecastSource;
use crate::model::{ForecastError, HourlySeries, MonitoringPoint};

/// The evaluated state of one point at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointAssessment {
    pub point: MonitoringPoint,
    /// Time of the now observation.
    pub observed_at: DateTime<Utc>,
    /// Same instant in the point's local timezone.
    pub observed_at_local: DateTime<FixedOffset>,
    pub rain_72h_mm: f64,
    pub soil_moisture: Option<f64>,
    /// Weather-only threat at now (before the susceptibility gate).
    pub threat: ClimateThreat,
    pub level: AlertLevel,
    /// Worst level over the forecast rows after now, if any could be formed.
    pub forecast_peak: Option<AlertLevel>,
    /// Number of hourly rows after now.
    pub forecast_hours: usize,
}

/// Evaluates `series` for `point` at `now`.
///
/// # Errors
/// - `ForecastError::NoObservationAtNow` — the series starts after `now`.
/// - `ForecastError::InsufficientHistory` — fewer than `window` complete
///   hours end at the now row.
pub fn assess(
    point: &MonitoringPoint,
    series: &HourlySeries,
    now: DateTime<Utc>,
    window: usize,
) -> Result<PointAssessment, ForecastError> {
    let index = now_index(series, now).ok_or(ForecastError::NoObservationAtNow)?;

    let rain_72h_mm = accumulation_at(series, index, window).ok_or_else(|| {
        ForecastError::InsufficientHistory {
            needed: window,
            available: complete_hours_at(series, index, window),
        }
    })?;

    let observation = &series.observations[index];
    let threat = climate_threat(rain_72h_mm, observation.soil_moisture);
    let level = gate_alert(threat, rain_72h_mm, point.susceptibility);

    let forecast_peak = (index + 1..series.len())
        .filter_map(|i| {
            let rain = accumulation_at(series, i, window)?;
            let threat = climate_threat(rain, series.observations[i].soil_moisture);
            Some(gate_alert(threat, rain, point.susceptibility))
        })
        .max();

    Ok(PointAssessment {
        point: point.clone(),
        observed_at: observation.time,
        observed_at_local: series.local_time(observation.time),
        rain_72h_mm,
        soil_moisture: observation.soil_moisture,
        threat,
        level,
        forecast_peak,
        forecast_hours: series.len() - index - 1,
    })
}

/// Outcome of evaluating one point: its series and the assessment, which
/// may have failed on its own without affecting other points.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub point: MonitoringPoint,
    pub series: HourlySeries,
    pub assessment: Result<PointAssessment, ForecastError>,
}

/// Fetches every point's series in one request and assesses each at `now`.
///
/// A fetch failure fails the whole evaluation; per-point assessment errors
/// are reported in each `Evaluation`.
pub fn evaluate(
    source: &dyn ForecastSource,
    points: &[MonitoringPoint],
    now: DateTime<Utc>,
    window: usize,
) -> Result<Vec<Evaluation>, ForecastError> {
    let all_series = source.hourly_series(points)?;

    if all_series.len() != points.len() {
        return Err(ForecastError::LocationMismatch {
            expected: points.len(),
            got: all_series.len(),
        });
    }

    Ok(points
        .iter()
        .zip(all_series)
        .map(|(point, series)| Evaluation {
            assessment: assess(point, &series, now, window),
            point: point.clone(),
            series,
        })
        .collect())
}

/// Successful assessments only, in point order.
pub fn successful(evaluations: &[Evaluation]) -> Vec<PointAssessment> {
    evaluations
        .iter()
        .filter_map(|e| e.assessment.as_ref().ok().cloned())
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
