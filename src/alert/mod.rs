/// Alerting for the landslide early-warning service.
///
/// Submodules:
/// - `thresholds` — pure threat/alert classification over (R, H, S).
/// - `assessment` — evaluates a point's hourly series at the now boundary.

pub mod assessment;
pub mod thresholds;
