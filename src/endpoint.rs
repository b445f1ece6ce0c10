/// HTTP endpoint for querying alert state
///
/// Provides a small JSON API for dashboards and field tools. Every request
/// evaluates against a fresh forecast (served from the response cache
/// when recent enough).
///
/// Endpoints:
/// - GET /health - Service health check
/// - GET /points - Monitoring point registry
/// - GET /assessments - Every point's assessment plus the regional summary
/// - GET /point/{id} - One point, with its hourly series and threat column
/// - GET /nearest?lat={lat}&lon={lon} - Assessment of the closest point
/// - GET /regional - Regional summary only

use std::collections::HashMap;
use std::io::Cursor;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::alert::assessment::{evaluate, successful, Evaluation, PointAssessment};
use crate::alert::thresholds::ClimateThreat;
use crate::analysis::rainfall::{hourly_threats, rolling_sum};
use crate::analysis::regional::regional_summary;
use crate::ingest::ForecastSource;
use crate::logging::{log_failure, DataSource};
use crate::model::{MonitoringPoint, RAIN_WINDOW_HOURS};
use crate::points::{find_point, haversine_km, nearest_point};

const AVAILABLE_ENDPOINTS: [&str; 6] = [
    "/health",
    "/points",
    "/assessments",
    "/point/{id}",
    "/nearest?lat={lat}&lon={lon}",
    "/regional",
];

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// An assessment with its level spelled out for display.
#[derive(Debug, Serialize)]
pub struct AssessmentView<'a> {
    #[serde(flatten)]
    pub assessment: &'a PointAssessment,
    pub level_label: &'static str,
    pub color: &'static str,
    pub message: &'static str,
}

impl<'a> From<&'a PointAssessment> for AssessmentView<'a> {
    fn from(assessment: &'a PointAssessment) -> Self {
        AssessmentView {
            assessment,
            level_label: assessment.level.label(),
            color: assessment.level.color(),
            message: assessment.level.message(),
        }
    }
}

/// One hourly row of chart data.
#[derive(Debug, Serialize)]
pub struct SeriesRow {
    pub time: DateTime<Utc>,
    pub local_time: DateTime<FixedOffset>,
    pub precipitation_mm: Option<f64>,
    pub soil_moisture: Option<f64>,
    pub rain_72h_mm: Option<f64>,
    pub threat: Option<ClimateThreat>,
}

fn series_rows(evaluation: &Evaluation) -> Vec<SeriesRow> {
    let series = &evaluation.series;
    let rain = rolling_sum(series, RAIN_WINDOW_HOURS);
    let threats = hourly_threats(series, RAIN_WINDOW_HOURS);

    series
        .observations
        .iter()
        .zip(rain)
        .zip(threats)
        .map(|((obs, rain_72h_mm), threat)| SeriesRow {
            time: obs.time,
            local_time: series.local_time(obs.time),
            precipitation_mm: obs.precipitation_mm,
            soil_moisture: obs.soil_moisture,
            rain_72h_mm,
            threat,
        })
        .collect()
}

/// Evaluation outcome as JSON: the assessment view, or the point id with
/// the reason it could not be assessed.
fn evaluation_json(evaluation: &Evaluation) -> Value {
    match &evaluation.assessment {
        Ok(assessment) => to_json(&AssessmentView::from(assessment)),
        Err(e) => json!({
            "point": evaluation.point,
            "error": e.to_string(),
        }),
    }
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value)
        .unwrap_or_else(|e| json!({ "error": format!("Serialization failed: {}", e) }))
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Resolves a request URL to a status code and JSON body.
pub fn route(
    url: &str,
    source: &dyn ForecastSource,
    points: &[MonitoringPoint],
    now: DateTime<Utc>,
) -> (u16, Value) {
    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path, parse_query(query)),
        None => (url, HashMap::new()),
    };

    match path {
        "/health" => handle_health(),
        "/points" => (200, json!({ "points": points })),
        "/assessments" => handle_assessments(source, points, now),
        "/regional" => handle_regional(source, points, now),
        "/nearest" => handle_nearest(source, points, &query, now),
        _ if path.starts_with("/point/") => {
            let id = decode(path.trim_start_matches("/point/"));
            handle_point(source, points, &id, now)
        }
        _ => (
            404,
            json!({
                "error": "Not found",
                "available_endpoints": AVAILABLE_ENDPOINTS,
            }),
        ),
    }
}

fn decode(raw: &str) -> String {
    urlencoding::decode(&raw.replace('+', " "))
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

/// Parses `a=1&b=2` into a map. Later duplicates win.
fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (decode(k), decode(v)),
            None => (decode(pair), String::new()),
        })
        .collect()
}

/// Runs an evaluation, turning a fetch failure into a 502 body.
fn evaluate_or_bad_gateway(
    source: &dyn ForecastSource,
    points: &[MonitoringPoint],
    now: DateTime<Utc>,
) -> Result<Vec<Evaluation>, (u16, Value)> {
    evaluate(source, points, now, RAIN_WINDOW_HOURS).map_err(|e| {
        log_failure(None, "endpoint evaluation", &e);
        (502, json!({ "error": format!("Forecast unavailable: {}", e) }))
    })
}

fn handle_health() -> (u16, Value) {
    (
        200,
        json!({
            "status": "ok",
            "service": "geoalerta_service",
            "version": env!("CARGO_PKG_VERSION"),
        }),
    )
}

fn handle_assessments(
    source: &dyn ForecastSource,
    points: &[MonitoringPoint],
    now: DateTime<Utc>,
) -> (u16, Value) {
    let evaluations = match evaluate_or_bad_gateway(source, points, now) {
        Ok(evaluations) => evaluations,
        Err(response) => return response,
    };

    let assessments: Vec<Value> = evaluations.iter().map(evaluation_json).collect();
    let regional = regional_summary(&successful(&evaluations));

    (
        200,
        json!({
            "evaluated_at": now,
            "assessments": assessments,
            "regional": regional,
        }),
    )
}

fn handle_regional(
    source: &dyn ForecastSource,
    points: &[MonitoringPoint],
    now: DateTime<Utc>,
) -> (u16, Value) {
    let evaluations = match evaluate_or_bad_gateway(source, points, now) {
        Ok(evaluations) => evaluations,
        Err(response) => return response,
    };

    match regional_summary(&successful(&evaluations)) {
        Some(summary) => (200, to_json(&summary)),
        None => (503, json!({ "error": "No point could be assessed" })),
    }
}

fn handle_point(
    source: &dyn ForecastSource,
    points: &[MonitoringPoint],
    id: &str,
    now: DateTime<Utc>,
) -> (u16, Value) {
    let Some(point) = find_point(points, id) else {
        return (
            404,
            json!({
                "error": format!("Point {} not found in registry", id),
                "point_id": id,
            }),
        );
    };

    let evaluations = match evaluate_or_bad_gateway(source, std::slice::from_ref(point), now) {
        Ok(evaluations) => evaluations,
        Err(response) => return response,
    };

    match evaluations.first() {
        Some(evaluation) => (
            200,
            json!({
                "assessment": evaluation_json(evaluation),
                "series": to_json(&series_rows(evaluation)),
            }),
        ),
        None => (502, json!({ "error": "Forecast returned no series", "point_id": id })),
    }
}

fn handle_nearest(
    source: &dyn ForecastSource,
    points: &[MonitoringPoint],
    query: &HashMap<String, String>,
    now: DateTime<Utc>,
) -> (u16, Value) {
    let coordinate = |key: &str| query.get(key).and_then(|v| v.trim().parse::<f64>().ok());

    let (Some(lat), Some(lon)) = (coordinate("lat"), coordinate("lon")) else {
        return (
            400,
            json!({ "error": "Query parameters lat and lon are required numbers" }),
        );
    };

    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return (400, json!({ "error": "Coordinates out of range", "lat": lat, "lon": lon }));
    }

    let Some(point) = nearest_point(points, lat, lon) else {
        return (404, json!({ "error": "No monitoring points configured" }));
    };
    let distance_km = haversine_km(lat, lon, point.latitude, point.longitude);

    let evaluations = match evaluate_or_bad_gateway(source, std::slice::from_ref(point), now) {
        Ok(evaluations) => evaluations,
        Err(response) => return response,
    };

    let assessment = evaluations.first().map(evaluation_json).unwrap_or(Value::Null);
    (
        200,
        json!({
            "distance_km": distance_km,
            "assessment": assessment,
        }),
    )
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

/// Start HTTP endpoint server on the specified port
pub fn start_endpoint_server(
    port: u16,
    source: &dyn ForecastSource,
    points: &[MonitoringPoint],
) -> Result<(), String> {
    let server = tiny_http::Server::http(format!("0.0.0.0:{}", port))
        .map_err(|e| format!("Failed to start HTTP server: {}", e))?;

    println!("📡 HTTP endpoint listening on http://0.0.0.0:{}", port);
    for endpoint in AVAILABLE_ENDPOINTS {
        println!("   GET {}", endpoint);
    }
    println!();

    for request in server.incoming_requests() {
        let url = request.url().to_string();
        let (status, body) = route(&url, source, points, Utc::now());

        tracing::info!(
            source = DataSource::Endpoint.as_str(),
            method = %request.method(),
            status,
            "{}",
            url
        );

        if let Err(e) = request.respond(create_response(status, &body)) {
            tracing::warn!(source = DataSource::Endpoint.as_str(), "Failed to send response: {}", e);
        }
    }

    Ok(())
}

/// Create HTTP response with JSON body
fn create_response(status_code: u16, json: &Value) -> tiny_http::Response<Cursor<Vec<u8>>> {
    let body = serde_json::to_string_pretty(json)
        .unwrap_or_else(|e| format!("{{\"error\": \"Serialization failed: {}\"}}", e));

    let mut response = tiny_http::Response::from_data(body.into_bytes())
        .with_status_code(tiny_http::StatusCode::from(status_code));

    if let Ok(header) = tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        response.add_header(header);
    }
    response
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
