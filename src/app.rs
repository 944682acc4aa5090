//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - installs logging
//! - builds the data source, cache and throttles from settings
//! - runs the metrics pipeline and prints reports
//! - writes optional exports

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::cli::{AddressArgs, Command, ForecastArgs, MetricsArgs, PerformersArgs, SourceArgs};
use crate::config::Settings;
use crate::data::{FixtureSource, HttpSnapshotClient, SnapshotSource, ThrottleRegistry};
use crate::domain::AggregationOptions;
use crate::error::AppError;
use crate::report::ScholarRow;

pub mod pipeline;

use pipeline::MetricsService;

/// Entry point for the `scholar` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    init_logging();

    let settings = Settings::from_env()?;
    let throttles = ThrottleRegistry::new();

    match cli.command {
        Command::Metrics(args) => handle_metrics(args, &settings, &throttles),
        Command::Performers(args) => handle_performers(args, &settings, &throttles),
        Command::NextClaim(args) => handle_next_claim(args, &settings, &throttles),
        Command::Forecast(args) => handle_forecast(args, &settings, &throttles),
        Command::Adventure(args) => handle_adventure(args, &settings, &throttles),
        Command::History(args) => handle_history(args, &settings, &throttles),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("scholar_metrics=info"));
    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_metrics(args: MetricsArgs, settings: &Settings, throttles: &ThrottleRegistry) -> Result<(), AppError> {
    let rows = load_rows(&args.source, settings, throttles)?;
    println!("{}", crate::report::format_metrics_table(&rows, Utc::now()));

    if let Some(path) = &args.export {
        crate::io::write_metrics_csv(path, &rows)?;
    }
    if let Some(path) = &args.json {
        crate::io::write_metrics_json(path, &rows)?;
    }
    Ok(())
}

fn handle_performers(
    args: PerformersArgs,
    settings: &Settings,
    throttles: &ThrottleRegistry,
) -> Result<(), AppError> {
    let rows = load_rows(&args.source, settings, throttles)?;
    let performers = crate::report::notable_performers(&rows, args.top, Utc::now());
    println!("{}", crate::report::format_performers(&performers));
    Ok(())
}

fn handle_next_claim(args: SourceArgs, settings: &Settings, throttles: &ThrottleRegistry) -> Result<(), AppError> {
    let rows = load_rows(&args, settings, throttles)?;
    let next = crate::report::closest_next_claim(&rows);
    print!("{}", crate::report::format_next_claim(next.as_ref(), Utc::now()));
    Ok(())
}

fn handle_forecast(args: ForecastArgs, settings: &Settings, throttles: &ThrottleRegistry) -> Result<(), AppError> {
    let rows = load_rows(&args.source, settings, throttles)?;
    let points = crate::report::earnings_forecast(
        rows.iter().map(|row| &row.metrics),
        Utc::now().date_naive(),
        args.days,
    );
    print!("{}", crate::report::format_forecast(&points));
    Ok(())
}

fn handle_adventure(args: AddressArgs, settings: &Settings, throttles: &ThrottleRegistry) -> Result<(), AppError> {
    let service = build_service(args.fixtures.as_deref(), settings, throttles)?;
    let progress = service.adventure(&args.address, Utc::now())?;
    print!("{}", crate::report::format_adventure(&args.address, &progress));
    Ok(())
}

fn handle_history(args: AddressArgs, settings: &Settings, throttles: &ThrottleRegistry) -> Result<(), AppError> {
    if args.fixtures.is_none() {
        settings.require_scholar_api()?;
    }
    let service = build_service(args.fixtures.as_deref(), settings, throttles)?;
    let data = service.scholar_data(&args.address, Utc::now())?;
    let series = crate::metrics::daily_earnings(&data.history.dates);
    print!("{}", crate::report::format_daily_earnings(&args.address, &series));
    Ok(())
}

fn build_service(
    fixtures: Option<&Path>,
    settings: &Settings,
    throttles: &ThrottleRegistry,
) -> Result<MetricsService, AppError> {
    let source: Arc<dyn SnapshotSource> = match fixtures {
        Some(dir) => Arc::new(FixtureSource::new(dir)),
        None => Arc::new(HttpSnapshotClient::new(settings, throttles)?),
    };
    Ok(MetricsService::with_settings(settings, source))
}

/// Fetch and aggregate every roster scholar; failures are reported and skipped.
fn load_rows(args: &SourceArgs, settings: &Settings, throttles: &ThrottleRegistry) -> Result<Vec<ScholarRow>, AppError> {
    if args.fixtures.is_none() {
        settings.require_scholar_api()?;
    }
    let roster = crate::io::read_roster(&args.roster)?;
    let service = build_service(args.fixtures.as_deref(), settings, throttles)?;

    let options = AggregationOptions {
        include_today_in_average: args.include_today,
    };
    let addresses: Vec<String> = roster.iter().map(|s| s.address.clone()).collect();
    let outcomes = service.compute_batch(&addresses, options, Utc::now());

    let mut rows = Vec::with_capacity(roster.len());
    for (scholar, outcome) in roster.into_iter().zip(outcomes) {
        match outcome.result {
            Ok(metrics) => rows.push(ScholarRow { scholar, metrics }),
            Err(err) => {
                warn!(address = %scholar.address, "skipping scholar");
                eprintln!("{}: {err}", scholar.display_name());
            }
        }
    }

    if rows.is_empty() && !addresses.is_empty() {
        return Err(AppError::new(4, "Every scholar fetch failed."));
    }
    Ok(rows)
}
