/// Open-Meteo forecast API client.
///
/// Handles URL construction and JSON response parsing for:
///   https://api.open-meteo.com/v1/forecast
///
/// One request covers every monitoring point: latitude and longitude are
/// sent as parallel comma-separated lists and the API answers with one
/// object per location (a bare object for a single location, an array
/// otherwise). See `fixtures.rs` for annotated examples.

use chrono::DateTime;
use serde::Deserialize;

use crate::config::ForecastConfig;
use crate::ingest::client::CachedClient;
use crate::ingest::ForecastSource;
use crate::model::{
    ForecastError, HourlyObservation, HourlySeries, MonitoringPoint, VAR_PRECIPITATION,
    VAR_SOIL_MOISTURE,
};

// ---------------------------------------------------------------------------
// Serde structures for the forecast JSON
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct LocationResponse {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    utc_offset_seconds: i32,
    #[serde(default = "default_timezone")]
    timezone: String,
    hourly: Option<HourlyBlock>,
}

#[derive(Deserialize)]
struct HourlyBlock {
    time: Vec<i64>, // unix seconds, requested via timeformat=unixtime
    precipitation: Option<Vec<Option<f64>>>,
    soil_moisture_0_to_1cm: Option<Vec<Option<f64>>>,
}

fn default_timezone() -> String {
    "GMT".to_string()
}

// ---------------------------------------------------------------------------
// URL construction
// ---------------------------------------------------------------------------

/// Builds a forecast URL requesting hourly precipitation and soil moisture
/// for every point, with the configured past/forecast windows.
///
/// # Example
/// ```
/// use geoalerta_service::config::ForecastConfig;
/// use geoalerta_service::ingest::open_meteo::build_forecast_url;
/// use geoalerta_service::points::default_points;
///
/// let url = build_forecast_url(&ForecastConfig::default(), &default_points());
/// assert!(url.contains("latitude=7.1193"));
/// ```
pub fn build_forecast_url(config: &ForecastConfig, points: &[MonitoringPoint]) -> String {
    let latitudes: Vec<String> = points.iter().map(|p| p.latitude.to_string()).collect();
    let longitudes: Vec<String> = points.iter().map(|p| p.longitude.to_string()).collect();

    format!(
        "{}?latitude={}&longitude={}&hourly={},{}&timezone={}&past_days={}&forecast_days={}&timeformat=unixtime",
        config.base_url,
        latitudes.join(","),
        longitudes.join(","),
        VAR_PRECIPITATION,
        VAR_SOIL_MOISTURE,
        urlencoding::encode(&config.timezone),
        config.past_days,
        config.forecast_days
    )
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Parses a forecast response body into one `HourlySeries` per location.
///
/// # Errors
/// - `ForecastError::Api` — the body is the API's error envelope.
/// - `ForecastError::Parse` — malformed JSON, a missing variable, arrays
///   of different lengths, or hours out of order.
/// - `ForecastError::NoDataAvailable` — a location has no hourly rows.
pub fn parse_forecast_response(json: &str) -> Result<Vec<HourlySeries>, ForecastError> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| ForecastError::Parse(format!("JSON deserialization failed: {}", e)))?;

    if let Some(reason) = api_error_reason(&value) {
        return Err(ForecastError::Api(reason));
    }

    let locations: Vec<LocationResponse> = if value.is_array() {
        serde_json::from_value(value)
    } else {
        serde_json::from_value(value).map(|one| vec![one])
    }
    .map_err(|e| ForecastError::Parse(format!("Unexpected response structure: {}", e)))?;

    locations.into_iter().map(location_to_series).collect()
}

/// Extracts `reason` from an `{"error": true, "reason": ...}` envelope.
pub(crate) fn api_error_reason(value: &serde_json::Value) -> Option<String> {
    if value.get("error").and_then(|e| e.as_bool()) != Some(true) {
        return None;
    }
    let reason = value
        .get("reason")
        .and_then(|r| r.as_str())
        .unwrap_or("unspecified error");
    Some(reason.to_string())
}

fn location_to_series(location: LocationResponse) -> Result<HourlySeries, ForecastError> {
    let hourly = location.hourly.ok_or_else(|| {
        ForecastError::NoDataAvailable(format!(
            "No hourly block for ({}, {})",
            location.latitude, location.longitude
        ))
    })?;

    if hourly.time.is_empty() {
        return Err(ForecastError::NoDataAvailable(format!(
            "Empty hourly series for ({}, {})",
            location.latitude, location.longitude
        )));
    }

    let precipitation = hourly
        .precipitation
        .ok_or_else(|| ForecastError::Parse(format!("Missing hourly variable '{}'", VAR_PRECIPITATION)))?;
    let soil_moisture = hourly
        .soil_moisture_0_to_1cm
        .ok_or_else(|| ForecastError::Parse(format!("Missing hourly variable '{}'", VAR_SOIL_MOISTURE)))?;

    let hours = hourly.time.len();
    if precipitation.len() != hours || soil_moisture.len() != hours {
        return Err(ForecastError::Parse(format!(
            "Hourly arrays differ in length: time={}, {}={}, {}={}",
            hours,
            VAR_PRECIPITATION,
            precipitation.len(),
            VAR_SOIL_MOISTURE,
            soil_moisture.len()
        )));
    }

    let mut observations: Vec<HourlyObservation> = Vec::with_capacity(hours);
    for ((secs, precipitation_mm), soil) in hourly.time.into_iter().zip(precipitation).zip(soil_moisture) {
        let time = DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| ForecastError::Parse(format!("Timestamp out of range: {}", secs)))?;

        if let Some(prev) = observations.last() {
            if time <= prev.time {
                return Err(ForecastError::Parse(format!(
                    "Hourly times not strictly increasing at {}",
                    time.to_rfc3339()
                )));
            }
        }

        observations.push(HourlyObservation {
            time,
            precipitation_mm,
            soil_moisture: soil,
        });
    }

    Ok(HourlySeries {
        latitude: location.latitude,
        longitude: location.longitude,
        timezone: location.timezone,
        utc_offset_seconds: location.utc_offset_seconds,
        observations,
    })
}

// ---------------------------------------------------------------------------
// Live source
// ---------------------------------------------------------------------------

/// Forecast source backed by the Open-Meteo HTTP API.
pub struct OpenMeteo {
    client: CachedClient,
    config: ForecastConfig,
}

impl OpenMeteo {
    pub fn new(client: CachedClient, config: ForecastConfig) -> Self {
        Self { client, config }
    }
}

impl ForecastSource for OpenMeteo {
    fn hourly_series(&self, points: &[MonitoringPoint]) -> Result<Vec<HourlySeries>, ForecastError> {
        if points.is_empty() {
            return Ok(Vec::new());
        }

        let url = build_forecast_url(&self.config, points);
        let body = self.client.get_text(&url)?;
        let series = parse_forecast_response(&body)?;

        if series.len() != points.len() {
            return Err(ForecastError::LocationMismatch {
                expected: points.len(),
                got: series.len(),
            });
        }

        Ok(series)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fixtures::*;
    use crate::points::default_points;

    fn two_points() -> Vec<MonitoringPoint> {
        vec![
            MonitoringPoint {
                id: "a".to_string(),
                name: "A".to_string(),
                latitude: 7.1193,
                longitude: -73.1227,
                susceptibility: 0.9,
            },
            MonitoringPoint {
                id: "b".to_string(),
                name: "B".to_string(),
                latitude: 6.2518,
                longitude: -75.5636,
                susceptibility: 0.7,
            },
        ]
    }

    // --- URL construction ---------------------------------------------------

    #[test]
    fn test_build_url_targets_forecast_endpoint_with_unix_times() {
        let url = build_forecast_url(&ForecastConfig::default(), &default_points());
        assert!(url.starts_with("https://api.open-meteo.com/v1/forecast?"));
        assert!(url.contains("timeformat=unixtime"));
    }

    #[test]
    fn test_build_url_requests_both_variables_and_windows() {
        let url = build_forecast_url(&ForecastConfig::default(), &default_points());
        assert!(url.contains("hourly=precipitation,soil_moisture_0_to_1cm"));
        assert!(url.contains("past_days=3"));
        assert!(url.contains("forecast_days=1"));
        assert!(url.contains("timezone=auto"));
    }

    #[test]
    fn test_build_url_lists_coordinates_in_point_order() {
        let url = build_forecast_url(&ForecastConfig::default(), &two_points());
        assert!(url.contains("latitude=7.1193,6.2518"));
        assert!(url.contains("longitude=-73.1227,-75.5636"));
    }

    #[test]
    fn test_build_url_encodes_timezone_name() {
        let config = ForecastConfig {
            timezone: "America/Bogota".to_string(),
            ..ForecastConfig::default()
        };
        let url = build_forecast_url(&config, &default_points());
        assert!(url.contains("timezone=America%2FBogota"));
    }

    // --- Parsing: well-formed responses -------------------------------------

    #[test]
    fn test_parse_single_point_values_and_metadata() {
        let series = parse_forecast_response(fixture_single_point_json())
            .expect("fixture should parse");

        assert_eq!(series.len(), 1);
        let s = &series[0];
        assert_eq!(s.timezone, "America/Bogota");
        assert_eq!(s.utc_offset_seconds, -18000);
        assert_eq!(s.len(), 4);
        assert_eq!(s.observations[0].time.timestamp(), FIXTURE_START_UNIX);
        assert_eq!(s.observations[2].precipitation_mm, Some(1.2));
        assert_eq!(s.observations[3].soil_moisture, Some(0.341));
    }

    #[test]
    fn test_parse_hours_are_one_hour_apart() {
        let series = parse_forecast_response(fixture_single_point_json()).unwrap();
        let obs = &series[0].observations;
        for pair in obs.windows(2) {
            assert_eq!((pair[1].time - pair[0].time).num_seconds(), 3600);
        }
    }

    #[test]
    fn test_parse_multi_point_returns_series_in_order() {
        let series = parse_forecast_response(fixture_multi_point_json()).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].latitude, 7.125);
        assert_eq!(series[1].latitude, 6.25);
    }

    #[test]
    fn test_parse_null_values_become_none() {
        let series = parse_forecast_response(fixture_multi_point_json()).unwrap();
        let last = series[1].observations.last().unwrap();
        assert_eq!(last.precipitation_mm, None);
        assert_eq!(last.soil_moisture, None);
    }

    #[test]
    fn test_parse_generated_96_hour_series() {
        let json = forecast_json(96, 0.5, 0.3).to_string();
        let series = parse_forecast_response(&json).unwrap();
        assert_eq!(series[0].len(), 96);
    }

    // --- Parsing: failures --------------------------------------------------

    #[test]
    fn test_parse_error_envelope_returns_api_error() {
        match parse_forecast_response(fixture_error_json()) {
            Err(ForecastError::Api(reason)) => assert!(reason.contains("Latitude")),
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_length_mismatch_returns_parse_error() {
        let result = parse_forecast_response(fixture_length_mismatch_json());
        assert!(matches!(result, Err(ForecastError::Parse(_))));
    }

    #[test]
    fn test_parse_unsorted_times_returns_parse_error() {
        let result = parse_forecast_response(fixture_unsorted_time_json());
        assert!(matches!(result, Err(ForecastError::Parse(_))));
    }

    #[test]
    fn test_parse_empty_hourly_returns_no_data_available() {
        let result = parse_forecast_response(fixture_empty_hourly_json());
        assert!(matches!(result, Err(ForecastError::NoDataAvailable(_))));
    }

    #[test]
    fn test_parse_missing_variable_returns_parse_error() {
        let json = r#"{"latitude": 7.1, "longitude": -73.1, "hourly": {"time": [1714539600]}}"#;
        match parse_forecast_response(json) {
            Err(ForecastError::Parse(msg)) => assert!(msg.contains("precipitation")),
            other => panic!("expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_malformed_json_returns_parse_error() {
        let result = parse_forecast_response("{ this is not json }");
        assert!(matches!(result, Err(ForecastError::Parse(_))));
    }

    #[test]
    fn test_parse_empty_string_returns_parse_error() {
        let result = parse_forecast_response("");
        assert!(matches!(result, Err(ForecastError::Parse(_))));
    }

    #[test]
    fn test_api_error_reason_ignores_normal_bodies() {
        let value: serde_json::Value = serde_json::from_str(fixture_single_point_json()).unwrap();
        assert_eq!(api_error_reason(&value), None);
    }
}
