/// Shared data types for the landslide early-warning service.
///
/// Types here are produced by the ingest layer and consumed by analysis,
/// alerting, notification, and the HTTP endpoint. Nothing in this module
/// performs I/O.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Open-Meteo hourly variables
// ---------------------------------------------------------------------------

/// Hourly precipitation total (mm) for the preceding hour.
pub const VAR_PRECIPITATION: &str = "precipitation";
/// Volumetric soil water content of the topmost 0–1 cm layer (m³/m³).
pub const VAR_SOIL_MOISTURE: &str = "soil_moisture_0_to_1cm";

/// Trailing accumulation window, in hourly observations.
pub const RAIN_WINDOW_HOURS: usize = 72;

// ---------------------------------------------------------------------------
// Monitoring points
// ---------------------------------------------------------------------------

/// A monitored hillside location with its precomputed terrain susceptibility.
///
/// Susceptibility comes from an external geospatial model and is never
/// recomputed here. Points are immutable once the registry is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringPoint {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Static susceptibility score, 0 (safe) to 1 (highest risk).
    pub susceptibility: f64,
}

// ---------------------------------------------------------------------------
// Hourly series
// ---------------------------------------------------------------------------

/// One hourly row from the forecast API.
///
/// Either variable may be missing: the API emits `null` for hours it has
/// no value for (typically at the far end of the forecast horizon).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyObservation {
    pub time: DateTime<Utc>,
    pub precipitation_mm: Option<f64>,
    pub soil_moisture: Option<f64>,
}

/// The ordered hourly series returned for a single point.
///
/// Covers `past_days` of history followed by `forecast_days` of forecast.
/// Observations are strictly increasing in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlySeries {
    /// Grid-cell coordinates as echoed by the API (snapped, not the request).
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub utc_offset_seconds: i32,
    pub observations: Vec<HourlyObservation>,
}

impl HourlySeries {
    /// Display offset for this series' location.
    ///
    /// Falls back to UTC if the API reported an out-of-range offset.
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_seconds).unwrap_or_else(|| Utc.fix())
    }

    /// Converts a UTC instant into the series' local time for display.
    pub fn local_time(&self, time: DateTime<Utc>) -> DateTime<FixedOffset> {
        time.with_timezone(&self.offset())
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when fetching, parsing, or evaluating forecast data.
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Non-2xx HTTP response that was not retried or ran out of retries.
    Http(u16),
    /// Connection, timeout, or body-read failure.
    Transport(String),
    /// The API answered with its `{"error": true, "reason": ...}` body.
    Api(String),
    /// The response body could not be deserialized or was inconsistent.
    Parse(String),
    /// The response contained no hourly rows.
    NoDataAvailable(String),
    /// The number of series returned differs from the number requested.
    LocationMismatch { expected: usize, got: usize },
    /// Every observation lies in the future; there is no "now" row.
    NoObservationAtNow,
    /// Not enough history before "now" to fill the accumulation window
    /// (or a value inside it is missing).
    InsufficientHistory { needed: usize, available: usize },
    /// The on-disk response cache could not be read or written.
    Cache(String),
}

impl std::fmt::Display for ForecastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForecastError::Http(code) => write!(f, "HTTP error: {}", code),
            ForecastError::Transport(msg) => write!(f, "Transport error: {}", msg),
            ForecastError::Api(reason) => write!(f, "API error: {}", reason),
            ForecastError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ForecastError::NoDataAvailable(msg) => write!(f, "No data available: {}", msg),
            ForecastError::LocationMismatch { expected, got } => write!(
                f,
                "Location mismatch: requested {} points, received {} series",
                expected, got
            ),
            ForecastError::NoObservationAtNow => {
                write!(f, "No observation at or before the current time")
            }
            ForecastError::InsufficientHistory { needed, available } => write!(
                f,
                "Insufficient history: {} complete hourly values needed, {} available",
                needed, available
            ),
            ForecastError::Cache(msg) => write!(f, "Cache error: {}", msg),
        }
    }
}

impl std::error::Error for ForecastError {}
