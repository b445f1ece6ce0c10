//! Rain/soil threat classification.
//!
//! Two pure steps. The climatic threat comes from the trailing rain
//! accumulation and current soil moisture alone. The alert level then gates
//! that threat on the point's static terrain susceptibility. `classify`
//! gives the threat as seen through the gate; `alert_level` runs both
//! steps. Every comparison is strict: a value equal to a threshold does
//! not cross it.

use serde::{Serialize, Serializer};

// ---------------------------------------------------------------------------
// Threshold matrix
// ---------------------------------------------------------------------------

/// 72-hour accumulation (mm) above which the threat is at least 1.
pub const RAIN_LOW_MM: f64 = 15.0;
/// 72-hour accumulation (mm) above which the threat is at least 2.
pub const RAIN_MEDIUM_MM: f64 = 40.0;
/// 72-hour accumulation (mm) above which the threat is 3 outright.
pub const RAIN_HIGH_MM: f64 = 60.0;
/// Accumulation (mm) that raises threat to 3 when the soil is also saturated.
pub const RAIN_SATURATED_MM: f64 = 20.0;
/// Soil moisture (m³/m³) treated as saturated.
pub const SOIL_SATURATED: f64 = 0.4;
/// Minimum accumulation (mm) for a preventive alert on a high-risk point
/// that carries no climatic threat.
pub const RAIN_PREVENTIVE_MM: f64 = 5.0;
/// Susceptibility at or below which no alert is ever raised.
pub const SUSCEPTIBILITY_GATE: f64 = 0.8;

// ---------------------------------------------------------------------------
// Climatic threat
// ---------------------------------------------------------------------------

/// Weather-only threat level, in ascending order of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClimateThreat {
    None,
    Low,
    Medium,
    High,
}

impl ClimateThreat {
    pub fn as_u8(self) -> u8 {
        match self {
            ClimateThreat::None => 0,
            ClimateThreat::Low => 1,
            ClimateThreat::Medium => 2,
            ClimateThreat::High => 3,
        }
    }
}

impl Serialize for ClimateThreat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

/// Classifies weather conditions into a climatic threat level.
///
/// `rain_72h_mm` is the trailing accumulation, `soil_moisture` the current
/// volumetric fraction. A missing soil reading never counts as saturated.
pub fn climate_threat(rain_72h_mm: f64, soil_moisture: Option<f64>) -> ClimateThreat {
    let saturated = soil_moisture.is_some_and(|h| h > SOIL_SATURATED);

    if rain_72h_mm > RAIN_HIGH_MM || (saturated && rain_72h_mm > RAIN_SATURATED_MM) {
        ClimateThreat::High
    } else if rain_72h_mm > RAIN_MEDIUM_MM {
        ClimateThreat::Medium
    } else if rain_72h_mm > RAIN_LOW_MM {
        ClimateThreat::Low
    } else {
        ClimateThreat::None
    }
}

// ---------------------------------------------------------------------------
// Alert level
// ---------------------------------------------------------------------------

/// Final alert level shown to operators, in ascending order of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AlertLevel {
    /// Green
    Normal,
    /// Yellow
    Preventive,
    /// Orange
    Alert,
    /// Red
    Evacuation,
}

impl AlertLevel {
    pub const ALL: [AlertLevel; 4] = [
        AlertLevel::Normal,
        AlertLevel::Preventive,
        AlertLevel::Alert,
        AlertLevel::Evacuation,
    ];

    pub fn as_u8(self) -> u8 {
        match self {
            AlertLevel::Normal => 0,
            AlertLevel::Preventive => 1,
            AlertLevel::Alert => 2,
            AlertLevel::Evacuation => 3,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(AlertLevel::Normal),
            1 => Some(AlertLevel::Preventive),
            2 => Some(AlertLevel::Alert),
            3 => Some(AlertLevel::Evacuation),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AlertLevel::Normal => "normal",
            AlertLevel::Preventive => "preventive",
            AlertLevel::Alert => "alert",
            AlertLevel::Evacuation => "evacuation",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            AlertLevel::Normal => "green",
            AlertLevel::Preventive => "yellow",
            AlertLevel::Alert => "orange",
            AlertLevel::Evacuation => "red",
        }
    }

    /// Operator-facing status line.
    pub fn message(self) -> &'static str {
        match self {
            AlertLevel::Normal => "Normal conditions",
            AlertLevel::Preventive => "YELLOW: Preventive monitoring activated",
            AlertLevel::Alert => "ORANGE: Prepare response",
            AlertLevel::Evacuation => "RED: Immediate evacuation",
        }
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.as_u8(), self.label())
    }
}

impl Serialize for AlertLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

/// Climatic threat as it applies to a point: the raw threat where the
/// terrain is susceptible, `None` where it is not.
pub fn classify(rain_72h_mm: f64, soil_moisture: Option<f64>, susceptibility: f64) -> ClimateThreat {
    if susceptibility <= SUSCEPTIBILITY_GATE {
        return ClimateThreat::None;
    }
    climate_threat(rain_72h_mm, soil_moisture)
}

/// Gates a climatic threat on terrain susceptibility.
///
/// Points at or below the susceptibility gate never alert. Above it, a
/// medium or high threat means evacuation, a low threat means alert, and
/// even without a threat any rain above 5 mm starts preventive monitoring.
pub fn gate_alert(threat: ClimateThreat, rain_72h_mm: f64, susceptibility: f64) -> AlertLevel {
    if susceptibility <= SUSCEPTIBILITY_GATE {
        return AlertLevel::Normal;
    }

    match threat {
        ClimateThreat::High | ClimateThreat::Medium => AlertLevel::Evacuation,
        ClimateThreat::Low => AlertLevel::Alert,
        ClimateThreat::None if rain_72h_mm > RAIN_PREVENTIVE_MM => AlertLevel::Preventive,
        ClimateThreat::None => AlertLevel::Normal,
    }
}

/// Full evaluation of (R, H, S) into the operator alert level.
pub fn alert_level(rain_72h_mm: f64, soil_moisture: Option<f64>, susceptibility: f64) -> AlertLevel {
    gate_alert(
        climate_threat(rain_72h_mm, soil_moisture),
        rain_72h_mm,
        susceptibility,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
