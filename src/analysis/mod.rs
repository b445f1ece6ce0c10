/// Data analysis for the landslide early-warning service.
///
/// Submodules:
/// - `rainfall` — trailing accumulation, now boundary, per-hour threats.
/// - `regional` — summary across all monitored points.

pub mod rainfall;
pub mod regional;
