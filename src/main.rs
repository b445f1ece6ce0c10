//! GeoAlerta Service - Landslide early-warning run
//!
//! Fetches the hourly rain and soil moisture series for every monitoring
//! point in one Open-Meteo request, evaluates the alert level at the
//! current hour, prints the status of each point and the region, and
//! dispatches notifications for every point above normal.
//!
//! With `--endpoint` the service instead serves the JSON API, evaluating
//! on each request.
//!
//! Usage:
//!   cargo run --release                          # One evaluation run
//!   cargo run --release -- --endpoint 8080       # Serve the HTTP endpoint
//!   cargo run --release -- --config geoalerta.toml --points points.toml
//!
//! Environment:
//!   EMAIL_USER / EMAIL_PASS - notification sender (names configurable)
//!   RUST_LOG                - log filter, overrides [logging].level

use std::env;
use std::error::Error;

use chrono::Utc;

use geoalerta_service::alert::assessment::{evaluate, successful};
use geoalerta_service::analysis::regional::regional_summary;
use geoalerta_service::config::{ServiceConfig, DEFAULT_CONFIG_PATH};
use geoalerta_service::endpoint;
use geoalerta_service::ingest::client::CachedClient;
use geoalerta_service::ingest::open_meteo::OpenMeteo;
use geoalerta_service::logging::{self, log_evaluation_summary, log_failure};
use geoalerta_service::model::RAIN_WINDOW_HOURS;
use geoalerta_service::notify::{dispatch, LogNotifier, Notifier, OutboxNotifier, Sender};
use geoalerta_service::points::{load_points, DEFAULT_POINTS_PATH};

struct Options {
    config_path: String,
    points_path: String,
    endpoint_port: Option<u16>,
}

fn usage(program: &str) -> String {
    format!(
        "Usage: {} [--config FILE] [--points FILE] [--endpoint PORT]",
        program
    )
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let program = args.first().map(String::as_str).unwrap_or("geoalerta_service");
    let mut options = Options {
        config_path: DEFAULT_CONFIG_PATH.to_string(),
        points_path: DEFAULT_POINTS_PATH.to_string(),
        endpoint_port: None,
    };

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = args.get(i + 1);
        match (flag, value) {
            ("--config", Some(path)) => options.config_path = path.clone(),
            ("--points", Some(path)) => options.points_path = path.clone(),
            ("--endpoint", Some(port)) => {
                let port = port
                    .parse()
                    .map_err(|_| format!("Error: --endpoint requires a port number, got {}", port))?;
                options.endpoint_port = Some(port);
            }
            ("--config" | "--points" | "--endpoint", None) => {
                return Err(format!("Error: {} requires a value\n{}", flag, usage(program)));
            }
            _ => return Err(format!("Unknown argument: {}\n{}", flag, usage(program))),
        }
        i += 2;
    }

    Ok(options)
}

fn main() {
    println!("⛰️  GeoAlerta Landslide Early Warning");
    println!("====================================\n");

    dotenv::dotenv().ok();

    let args: Vec<String> = env::args().collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(options) {
        eprintln!("\n❌ {}\n", e);
        std::process::exit(1);
    }
}

fn run(options: Options) -> Result<(), Box<dyn Error>> {
    let config = ServiceConfig::load(&options.config_path)?;
    logging::init_logging(&config.logging)?;

    let points = load_points(&options.points_path)?;
    println!("📍 Loaded {} monitoring point(s)\n", points.len());

    let client = CachedClient::from_config(&config.http)?;
    let source = OpenMeteo::new(client, config.forecast.clone());

    if let Some(port) = options.endpoint_port {
        println!("🚀 Starting HTTP endpoint server...");
        endpoint::start_endpoint_server(port, &source, &points)?;
        return Ok(());
    }

    let now = Utc::now();
    println!("🌧️  Fetching forecast for {} point(s)...", points.len());
    let evaluations = match evaluate(&source, &points, now, RAIN_WINDOW_HOURS) {
        Ok(evaluations) => evaluations,
        Err(e) => {
            log_failure(None, "forecast fetch", &e);
            return Err(Box::new(e));
        }
    };

    println!("\n📋 Point status:");
    for evaluation in &evaluations {
        match &evaluation.assessment {
            Ok(a) => {
                let soil = a
                    .soil_moisture
                    .map(|h| format!("{:.2}", h))
                    .unwrap_or_else(|| "n/a".to_string());
                println!(
                    "   {} ({}) - Level {} | {} | R72h {:.1} mm | H {} | S {:.2} | {}",
                    a.point.id,
                    a.point.name,
                    a.level.as_u8(),
                    a.level.message(),
                    a.rain_72h_mm,
                    soil,
                    a.point.susceptibility,
                    a.observed_at_local.format("%Y-%m-%d %H:%M %:z"),
                );
                if let Some(peak) = a.forecast_peak.filter(|peak| *peak > a.level) {
                    println!(
                        "      ↗ forecast peak within {} h: level {}",
                        a.forecast_hours,
                        peak.as_u8()
                    );
                }
            }
            Err(e) => {
                log_failure(Some(&evaluation.point.id), "assessment", e);
                println!("   {} ({}) - ✗ {}", evaluation.point.id, evaluation.point.name, e);
            }
        }
    }

    let assessments = successful(&evaluations);
    log_evaluation_summary(
        evaluations.len(),
        assessments.len(),
        evaluations.len() - assessments.len(),
    );

    if let Some(summary) = regional_summary(&assessments) {
        let soil = summary
            .mean_soil_moisture
            .map(|h| format!("{:.2}", h))
            .unwrap_or_else(|| "n/a".to_string());
        println!("\n🗺️  Regional summary ({} point(s)):", summary.point_count);
        println!("   Mean R72h: {:.1} mm", summary.mean_rain_72h_mm);
        println!("   Mean soil moisture: {}", soil);
        println!("   Mean susceptibility: {:.2}", summary.mean_susceptibility);
        println!("   Worst level: {}", summary.worst_level);
    }

    let sender = Sender::from_env(&config.notify.user_env, &config.notify.pass_env);
    let notifier: Box<dyn Notifier> = match &config.notify.outbox_dir {
        Some(dir) => Box::new(OutboxNotifier::new(dir)),
        None => Box::new(LogNotifier),
    };

    let delivered = dispatch(&assessments, sender.as_ref(), notifier.as_ref(), now);
    if delivered > 0 {
        println!("\n✉️  Dispatched {} notification(s)", delivered);
    }
    println!();

    Ok(())
}
