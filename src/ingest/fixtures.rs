/// Test fixtures: representative payloads from the Open-Meteo forecast API.
///
/// The literal fixtures are truncated to a few hours but keep the real
/// envelope returned by:
///   https://api.open-meteo.com/v1/forecast?hourly=precipitation,soil_moisture_0_to_1cm&timeformat=unixtime&...
///
/// Open-Meteo response shape (one object per requested location; a JSON
/// array of them when more than one location is requested):
///   .latitude / .longitude   — grid cell actually used (snapped)
///   .utc_offset_seconds      — offset of the resolved timezone
///   .timezone                — IANA name, e.g. "America/Bogota"
///   .hourly_units            — units per variable
///   .hourly.time[]           — unix seconds (with timeformat=unixtime)
///   .hourly.precipitation[]  — mm, may contain null
///   .hourly.soil_moisture_0_to_1cm[] — m³/m³, may contain null
///
/// Errors come back as HTTP 400 with `{"error": true, "reason": "..."}`.
///
/// The builder helpers at the bottom generate full 96-hour series for
/// analysis tests without hand-writing hundreds of values.

use chrono::{DateTime, Duration, Utc};

use crate::model::{HourlyObservation, HourlySeries};

/// 2024-05-01T05:00:00Z, local midnight in Bogota.
pub(crate) const FIXTURE_START_UNIX: i64 = 1_714_539_600;

/// Single location (Bucaramanga escarpment), four hours, light rain.
pub(crate) fn fixture_single_point_json() -> &'static str {
    r#"{
      "latitude": 7.125,
      "longitude": -73.125,
      "generationtime_ms": 0.0629425048828125,
      "utc_offset_seconds": -18000,
      "timezone": "America/Bogota",
      "timezone_abbreviation": "-05",
      "elevation": 959.0,
      "hourly_units": {
        "time": "unixtime",
        "precipitation": "mm",
        "soil_moisture_0_to_1cm": "m³/m³"
      },
      "hourly": {
        "time": [1714539600, 1714543200, 1714546800, 1714550400],
        "precipitation": [0.0, 0.4, 1.2, 0.1],
        "soil_moisture_0_to_1cm": [0.312, 0.318, 0.335, 0.341]
      }
    }"#
}

/// Two locations in one response. The second has a trailing forecast hour
/// with no values, as the API emits past the end of its model run.
pub(crate) fn fixture_multi_point_json() -> &'static str {
    r#"[
      {
        "latitude": 7.125,
        "longitude": -73.125,
        "generationtime_ms": 0.05,
        "utc_offset_seconds": -18000,
        "timezone": "America/Bogota",
        "timezone_abbreviation": "-05",
        "elevation": 959.0,
        "location_id": 0,
        "hourly_units": { "time": "unixtime", "precipitation": "mm", "soil_moisture_0_to_1cm": "m³/m³" },
        "hourly": {
          "time": [1714539600, 1714543200, 1714546800],
          "precipitation": [2.0, 3.5, 0.0],
          "soil_moisture_0_to_1cm": [0.41, 0.43, 0.44]
        }
      },
      {
        "latitude": 6.25,
        "longitude": -75.5625,
        "generationtime_ms": 0.04,
        "utc_offset_seconds": -18000,
        "timezone": "America/Bogota",
        "timezone_abbreviation": "-05",
        "elevation": 1495.0,
        "location_id": 1,
        "hourly_units": { "time": "unixtime", "precipitation": "mm", "soil_moisture_0_to_1cm": "m³/m³" },
        "hourly": {
          "time": [1714539600, 1714543200, 1714546800],
          "precipitation": [0.0, 0.2, null],
          "soil_moisture_0_to_1cm": [0.27, 0.27, null]
        }
      }
    ]"#
}

/// Error body for an invalid request.
pub(crate) fn fixture_error_json() -> &'static str {
    r#"{
      "error": true,
      "reason": "Latitude must be in range of -90 to 90°. Given: 97.0."
    }"#
}

/// Variable arrays shorter than the time axis.
pub(crate) fn fixture_length_mismatch_json() -> &'static str {
    r#"{
      "latitude": 7.125,
      "longitude": -73.125,
      "utc_offset_seconds": -18000,
      "timezone": "America/Bogota",
      "hourly": {
        "time": [1714539600, 1714543200, 1714546800],
        "precipitation": [0.0, 0.4],
        "soil_moisture_0_to_1cm": [0.31, 0.32, 0.33]
      }
    }"#
}

/// Hours out of order.
pub(crate) fn fixture_unsorted_time_json() -> &'static str {
    r#"{
      "latitude": 7.125,
      "longitude": -73.125,
      "utc_offset_seconds": -18000,
      "timezone": "America/Bogota",
      "hourly": {
        "time": [1714543200, 1714539600],
        "precipitation": [0.0, 0.4],
        "soil_moisture_0_to_1cm": [0.31, 0.32]
      }
    }"#
}

/// Valid envelope with an empty time axis.
pub(crate) fn fixture_empty_hourly_json() -> &'static str {
    r#"{
      "latitude": 7.125,
      "longitude": -73.125,
      "utc_offset_seconds": -18000,
      "timezone": "America/Bogota",
      "hourly": { "time": [], "precipitation": [], "soil_moisture_0_to_1cm": [] }
    }"#
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Hourly series starting at `start`, one row per element, with every
/// value present.
pub(crate) fn series_from(start: DateTime<Utc>, precip: &[f64], soil: &[f64]) -> HourlySeries {
    let precip: Vec<_> = precip.iter().copied().map(Some).collect();
    let soil: Vec<_> = soil.iter().copied().map(Some).collect();
    hours_from(start, &precip, &soil)
}

/// Hourly series starting at `start` with explicit gaps.
pub(crate) fn hours_from(
    start: DateTime<Utc>,
    precip: &[Option<f64>],
    soil: &[Option<f64>],
) -> HourlySeries {
    assert_eq!(precip.len(), soil.len(), "fixture arrays must align");

    let observations = precip
        .iter()
        .zip(soil)
        .enumerate()
        .map(|(i, (p, h))| HourlyObservation {
            time: start + Duration::hours(i as i64),
            precipitation_mm: *p,
            soil_moisture: *h,
        })
        .collect();

    HourlySeries {
        latitude: 7.125,
        longitude: -73.125,
        timezone: "America/Bogota".to_string(),
        utc_offset_seconds: -18000,
        observations,
    }
}

/// Open-Meteo JSON object for a constant-rate series of `hours` rows
/// starting at `FIXTURE_START_UNIX`.
pub(crate) fn forecast_json(hours: usize, precip_mm: f64, soil: f64) -> serde_json::Value {
    let time: Vec<i64> = (0..hours as i64)
        .map(|i| FIXTURE_START_UNIX + i * 3600)
        .collect();

    serde_json::json!({
        "latitude": 7.125,
        "longitude": -73.125,
        "utc_offset_seconds": -18000,
        "timezone": "America/Bogota",
        "timezone_abbreviation": "-05",
        "hourly_units": { "time": "unixtime", "precipitation": "mm", "soil_moisture_0_to_1cm": "m³/m³" },
        "hourly": {
            "time": time,
            "precipitation": vec![precip_mm; hours],
            "soil_moisture_0_to_1cm": vec![soil; hours],
        }
    })
}
