/// geoalerta_service: landslide early-warning service for Colombian hillsides.
///
/// # Module structure
///
/// ```text
/// geoalerta_service
/// ├── model       — shared data types (MonitoringPoint, HourlySeries, ForecastError, …)
/// ├── config      — service configuration loader (geoalerta.toml)
/// ├── points      — monitoring point registry (points.toml) and nearest lookup
/// ├── logging     — tracing subscriber setup and fetch failure classification
/// ├── endpoint    — JSON HTTP API over the current assessments
/// ├── notify      — alert message composition and delivery
/// ├── ingest
/// │   ├── open_meteo — Open-Meteo forecast API: URL construction + JSON parsing
/// │   ├── client     — blocking HTTP with on-disk cache and retries
/// │   └── fixtures (test only) — representative API response payloads
/// ├── alert
/// │   ├── thresholds — rain/soil/susceptibility classification
/// │   └── assessment — evaluates each point at the now boundary
/// └── analysis
///     ├── rainfall   — 72-hour trailing accumulation and per-hour threats
///     └── regional   — summary across all points
/// ```

/// Public modules
pub mod alert;
pub mod analysis;
pub mod config;
pub mod endpoint;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod notify;
pub mod points;
