/// Data ingestion from the forecast API.
///
/// Submodules:
/// - `open_meteo` — URL construction, JSON parsing, `OpenMeteo` source.
/// - `client`     — blocking HTTP with on-disk response cache and retries.
/// - `fixtures`   — (test only) representative API payloads.

pub mod client;
pub mod open_meteo;

#[cfg(test)]
pub(crate) mod fixtures;

use crate::model::{ForecastError, HourlySeries, MonitoringPoint};

/// Anything that can produce hourly series for a set of points.
///
/// Implementations return exactly one series per requested point, in
/// request order.
pub trait ForecastSource {
    fn hourly_series(&self, points: &[MonitoringPoint]) -> Result<Vec<HourlySeries>, ForecastError>;
}
