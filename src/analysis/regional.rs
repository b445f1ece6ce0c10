/// Regional summary across monitoring points.
///
/// What the dashboard shows before any point is selected: averages of the
/// inputs across the region plus the worst alert anywhere in it.

use serde::Serialize;

use crate::alert::assessment::PointAssessment;
use crate::alert::thresholds::AlertLevel;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalSummary {
    pub point_count: usize,
    pub mean_rain_72h_mm: f64,
    /// Mean over points that reported soil moisture at now.
    pub mean_soil_moisture: Option<f64>,
    pub mean_susceptibility: f64,
    pub worst_level: AlertLevel,
    /// Number of points at each level, indexed by level (0..=3).
    pub level_counts: [usize; 4],
}

/// Summarizes `assessments`. Returns `None` for an empty slice.
pub fn regional_summary(assessments: &[PointAssessment]) -> Option<RegionalSummary> {
    let worst_level = assessments.iter().map(|a| a.level).max()?;
    let n = assessments.len() as f64;

    let mean_rain_72h_mm = assessments.iter().map(|a| a.rain_72h_mm).sum::<f64>() / n;
    let mean_susceptibility = assessments.iter().map(|a| a.point.susceptibility).sum::<f64>() / n;

    let soil: Vec<f64> = assessments.iter().filter_map(|a| a.soil_moisture).collect();
    let mean_soil_moisture = if soil.is_empty() {
        None
    } else {
        Some(soil.iter().sum::<f64>() / soil.len() as f64)
    };

    let mut level_counts = [0usize; 4];
    for a in assessments {
        level_counts[a.level.as_u8() as usize] += 1;
    }

    Some(RegionalSummary {
        point_count: assessments.len(),
        mean_rain_72h_mm,
        mean_soil_moisture,
        mean_susceptibility,
        worst_level,
        level_counts,
    })
}
