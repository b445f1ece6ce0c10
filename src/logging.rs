/// Structured logging for the early-warning service
///
/// Installs a `tracing` subscriber with a console layer on stderr and an
/// optional plain-text file layer. Events carry a `source` field naming
/// the subsystem and, where relevant, a `point` field with the monitoring
/// point id. Fetch failures are classified before logging so that a
/// routine outage does not read like a service fault.

use std::fmt;
use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt as tracing_fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::model::ForecastError;

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    OpenMeteo,
    Cache,
    Notify,
    Endpoint,
    System,
}

impl DataSource {
    pub fn as_str(self) -> &'static str {
        match self {
            DataSource::OpenMeteo => "open-meteo",
            DataSource::Cache => "cache",
            DataSource::Notify => "notify",
            DataSource::Endpoint => "endpoint",
            DataSource::System => "system",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Failure classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Expected - the data simply is not there yet (e.g. a point evaluated
    /// before enough history accumulated).
    Expected,
    /// Unexpected - service degradation, API change, or misconfiguration.
    Unexpected,
    /// Unknown - cannot tell which.
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Classifies a forecast failure.
pub fn classify_failure(err: &ForecastError) -> FailureType {
    match err {
        ForecastError::InsufficientHistory { .. } | ForecastError::NoObservationAtNow => {
            FailureType::Expected
        }
        ForecastError::Http(_)
        | ForecastError::Api(_)
        | ForecastError::Parse(_)
        | ForecastError::LocationMismatch { .. } => FailureType::Unexpected,
        ForecastError::Transport(_) | ForecastError::NoDataAvailable(_) | ForecastError::Cache(_) => {
            FailureType::Unknown
        }
    }
}

/// Logs a forecast failure at a level matching its classification.
pub fn log_failure(point_id: Option<&str>, operation: &str, err: &ForecastError) {
    let failure_type = classify_failure(err);
    let point = point_id.unwrap_or("-");
    let source = DataSource::OpenMeteo.as_str();

    match failure_type {
        FailureType::Expected => {
            tracing::debug!(source, point, "{} failed [{}]: {}", operation, failure_type, err)
        }
        FailureType::Unexpected => {
            tracing::error!(source, point, "{} failed [{}]: {}", operation, failure_type, err)
        }
        FailureType::Unknown => {
            tracing::warn!(source, point, "{} failed [{}]: {}", operation, failure_type, err)
        }
    }
}

/// Logs a one-line summary of an evaluation run.
pub fn log_evaluation_summary(total: usize, successful: usize, failed: usize) {
    let source = DataSource::System.as_str();
    if failed == 0 {
        tracing::info!(source, "Evaluation complete: {}/{} points assessed", successful, total);
    } else if successful == 0 {
        tracing::error!(source, "Evaluation failed: 0/{} points assessed", total);
    } else {
        tracing::warn!(
            source,
            "Evaluation partial: {}/{} points assessed, {} failed",
            successful,
            total,
            failed
        );
    }
}

// ---------------------------------------------------------------------------
// Subscriber setup
// ---------------------------------------------------------------------------

/// Installs the global subscriber.
///
/// `RUST_LOG` overrides `config.level`. Calling this more than once is
/// harmless; later calls leave the first subscriber in place.
///
/// # Errors
/// Returns an error if the configured log file cannot be opened.
pub fn init_logging(config: &LoggingConfig) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = match &config.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let console_layer = tracing_fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    Ok(())
}
