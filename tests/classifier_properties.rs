//! Classifier property tests
//!
//! Properties of the (R, H, S) classification:
//! - Susceptibility at or below the gate never raises an alert
//! - Both classifications are monotone non-decreasing in rain
//! - Saturated soil never lowers the outcome
//! - The 72-hour rolling sum matches a direct window sum

use chrono::{Duration, TimeZone, Utc};
use geoalerta_service::alert::thresholds::{
    alert_level, classify, AlertLevel, ClimateThreat, SUSCEPTIBILITY_GATE,
};
use geoalerta_service::analysis::rainfall::rolling_sum;
use geoalerta_service::model::{HourlyObservation, HourlySeries, RAIN_WINDOW_HOURS};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn rain_strategy() -> impl Strategy<Value = f64> {
    0.0f64..200.0
}

fn soil_strategy() -> impl Strategy<Value = Option<f64>> {
    prop::option::of(0.0f64..0.6)
}

fn susceptible_strategy() -> impl Strategy<Value = f64> {
    0.8001f64..=1.0
}

fn series_of(precip: &[f64]) -> HourlySeries {
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    HourlySeries {
        latitude: 7.125,
        longitude: -73.125,
        timezone: "GMT".to_string(),
        utc_offset_seconds: 0,
        observations: precip
            .iter()
            .enumerate()
            .map(|(i, p)| HourlyObservation {
                time: start + Duration::hours(i as i64),
                precipitation_mm: Some(*p),
                soil_moisture: Some(0.3),
            })
            .collect(),
    }
}

// ============================================================================
// Reference points
// ============================================================================

#[test]
fn test_reference_classifications() {
    assert_eq!(classify(0.0, Some(0.0), 0.9), ClimateThreat::None);
    assert_eq!(classify(16.0, Some(0.0), 0.9), ClimateThreat::Low);
    assert_eq!(classify(41.0, Some(0.0), 0.9), ClimateThreat::Medium);
    assert_eq!(classify(61.0, Some(0.0), 0.9), ClimateThreat::High);
    assert_eq!(classify(25.0, Some(0.41), 0.9), ClimateThreat::High);

    assert_eq!(alert_level(0.0, Some(0.0), 0.9), AlertLevel::Normal);
    assert_eq!(alert_level(5.1, Some(0.0), 0.9), AlertLevel::Preventive);
    assert_eq!(alert_level(16.0, Some(0.0), 0.9), AlertLevel::Alert);
    assert_eq!(alert_level(41.0, Some(0.0), 0.9), AlertLevel::Evacuation);
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Low-susceptibility terrain stays at level 0 whatever the weather.
    #[test]
    fn prop_gate_blocks_low_susceptibility(
        rain in rain_strategy(),
        soil in soil_strategy(),
        susceptibility in 0.0f64..=SUSCEPTIBILITY_GATE,
    ) {
        prop_assert_eq!(classify(rain, soil, susceptibility), ClimateThreat::None);
        prop_assert_eq!(alert_level(rain, soil, susceptibility), AlertLevel::Normal);
    }

    /// More rain never lowers the outcome.
    #[test]
    fn prop_monotone_in_rain(
        rain in rain_strategy(),
        extra in 0.0f64..100.0,
        soil in soil_strategy(),
        susceptibility in susceptible_strategy(),
    ) {
        let wetter = rain + extra;
        prop_assert!(classify(wetter, soil, susceptibility) >= classify(rain, soil, susceptibility));
        prop_assert!(alert_level(wetter, soil, susceptibility) >= alert_level(rain, soil, susceptibility));
    }

    /// A soil reading, saturated or not, never scores below no reading.
    #[test]
    fn prop_soil_reading_never_lowers_level(
        rain in rain_strategy(),
        soil in 0.0f64..0.6,
        susceptibility in susceptible_strategy(),
    ) {
        prop_assert!(alert_level(rain, Some(soil), susceptibility) >= alert_level(rain, None, susceptibility));
    }

    /// Any positive threat on susceptible terrain is at least an alert.
    #[test]
    fn prop_threat_implies_alert(
        rain in 15.0001f64..200.0,
        soil in soil_strategy(),
        susceptibility in susceptible_strategy(),
    ) {
        prop_assert!(alert_level(rain, soil, susceptibility) >= AlertLevel::Alert);
    }

    /// The rolling sum is undefined before the window fills and equals the
    /// direct window sum afterwards.
    #[test]
    fn prop_rolling_sum_matches_window(precip in prop::collection::vec(0.0f64..5.0, 0..120)) {
        let sums = rolling_sum(&series_of(&precip), RAIN_WINDOW_HOURS);
        prop_assert_eq!(sums.len(), precip.len());

        for (i, sum) in sums.iter().enumerate() {
            if i + 1 < RAIN_WINDOW_HOURS {
                prop_assert!(sum.is_none());
            } else {
                let expected: f64 = precip[i + 1 - RAIN_WINDOW_HOURS..=i].iter().sum();
                let actual = sum.unwrap_or(f64::NAN);
                prop_assert!((actual - expected).abs() < 1e-9);
            }
        }
    }
}
