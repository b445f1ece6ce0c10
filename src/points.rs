/// Monitoring point registry.
///
/// Points (coordinates plus static susceptibility) are produced offline by
/// the susceptibility model and kept in `points.toml`. This module loads and
/// validates that registry, and answers the two lookups the endpoint needs:
/// by id, and nearest to a clicked coordinate. When no registry file exists
/// the service falls back to a single built-in point.

use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::config::ConfigError;
use crate::model::MonitoringPoint;

pub const DEFAULT_POINTS_PATH: &str = "points.toml";

/// Mean Earth radius used for great-circle distances.
const EARTH_RADIUS_KM: f64 = 6371.0088;

/// One `[[point]]` table in points.toml.
#[derive(Debug, Clone, Deserialize)]
struct PointConfig {
    id: String,
    name: Option<String>,
    latitude: f64,
    longitude: f64,
    susceptibility: f64,
}

/// Root structure for TOML parsing.
#[derive(Debug, Deserialize)]
struct PointRegistry {
    #[serde(default)]
    point: Vec<PointConfig>,
}

impl From<PointConfig> for MonitoringPoint {
    fn from(config: PointConfig) -> Self {
        MonitoringPoint {
            name: config.name.unwrap_or_else(|| config.id.clone()),
            id: config.id,
            latitude: config.latitude,
            longitude: config.longitude,
            susceptibility: config.susceptibility,
        }
    }
}

/// The built-in registry: one highly susceptible slope above Bucaramanga,
/// Santander.
pub fn default_points() -> Vec<MonitoringPoint> {
    vec![MonitoringPoint {
        id: "santander-01".to_string(),
        name: "Bucaramanga escarpment, Santander".to_string(),
        latitude: 7.1193,
        longitude: -73.1227,
        susceptibility: 0.90,
    }]
}

/// Loads the registry from `path`, or the built-in point if it is absent.
pub fn load_points(path: impl AsRef<Path>) -> Result<Vec<MonitoringPoint>, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(default_points());
    }

    let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    parse_points(&contents).map_err(|e| match e {
        ConfigError::Parse { message, .. } => ConfigError::Parse {
            path: path.display().to_string(),
            message,
        },
        other => other,
    })
}

/// Parses and validates a points.toml document.
pub fn parse_points(contents: &str) -> Result<Vec<MonitoringPoint>, ConfigError> {
    let registry: PointRegistry = toml::from_str(contents).map_err(|e| ConfigError::Parse {
        path: "<string>".to_string(),
        message: e.to_string(),
    })?;

    let points: Vec<MonitoringPoint> = registry.point.into_iter().map(Into::into).collect();
    validate_points(&points)?;
    Ok(points)
}

/// Rejects empty registries, blank, duplicate or non-slug ids, out-of-range
/// coordinates, and susceptibility outside [0, 1].
pub fn validate_points(points: &[MonitoringPoint]) -> Result<(), ConfigError> {
    if points.is_empty() {
        return Err(ConfigError::Invalid("point registry is empty".to_string()));
    }

    let mut seen = HashSet::new();
    for point in points {
        if point.id.trim().is_empty() {
            return Err(ConfigError::Invalid("point id must not be empty".to_string()));
        }
        if !point.id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(ConfigError::Invalid(format!(
                "point id '{}' may only contain ASCII letters, digits, '-' and '_'",
                point.id
            )));
        }
        if !seen.insert(point.id.as_str()) {
            return Err(ConfigError::Invalid(format!("duplicate point id '{}'", point.id)));
        }
        if !(-90.0..=90.0).contains(&point.latitude) {
            return Err(ConfigError::Invalid(format!(
                "{}: latitude {} out of range",
                point.id, point.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&point.longitude) {
            return Err(ConfigError::Invalid(format!(
                "{}: longitude {} out of range",
                point.id, point.longitude
            )));
        }
        if !(0.0..=1.0).contains(&point.susceptibility) {
            return Err(ConfigError::Invalid(format!(
                "{}: susceptibility {} outside [0, 1]",
                point.id, point.susceptibility
            )));
        }
    }

    Ok(())
}

/// Looks up a point by id. Returns `None` if not found.
pub fn find_point<'a>(points: &'a [MonitoringPoint], id: &str) -> Option<&'a MonitoringPoint> {
    points.iter().find(|p| p.id == id)
}

/// Great-circle distance in kilometres (haversine).
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// The registry point closest to (`latitude`, `longitude`).
pub fn nearest_point(
    points: &[MonitoringPoint],
    latitude: f64,
    longitude: f64,
) -> Option<&MonitoringPoint> {
    points.iter().min_by(|a, b| {
        let da = haversine_km(latitude, longitude, a.latitude, a.longitude);
        let db = haversine_km(latitude, longitude, b.latitude, b.longitude);
        da.total_cmp(&db)
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
