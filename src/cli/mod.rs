//! Command-line parsing for the scholar earnings tracker.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the aggregation and fetch code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "scholar", version, about = "Scholar earnings metrics from game API snapshots")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Per-scholar balances, deltas, daily average and next claim.
    Metrics(MetricsArgs),
    /// Top and bottom performers by average per day.
    Performers(PerformersArgs),
    /// Closest upcoming claim across the roster.
    NextClaim(SourceArgs),
    /// Projected combined balance assuming constant averages and no claims.
    Forecast(ForecastArgs),
    /// Daily adventure (PvE) progress for one address.
    Adventure(AddressArgs),
    /// Per-day earnings of one address (contiguous days only).
    History(AddressArgs),
}

/// Where scholar data comes from.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Roster JSON: `[{ "address": "...", "name": "...", "inactive": false }]`.
    #[arg(long, value_name = "JSON")]
    pub roster: PathBuf,

    /// Read recorded payloads from `<DIR>/<address>.json` instead of the network.
    #[arg(long, value_name = "DIR")]
    pub fixtures: Option<PathBuf>,

    /// Fold today's partial earnings into the daily average.
    #[arg(long)]
    pub include_today: bool,
}

#[derive(Debug, Args, Clone)]
pub struct MetricsArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Export per-scholar metrics to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export per-scholar metrics to JSON.
    #[arg(long, value_name = "JSON")]
    pub json: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct PerformersArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Scholars shown on each side.
    #[arg(long, default_value_t = 5)]
    pub top: usize,
}

#[derive(Debug, Args, Clone)]
pub struct ForecastArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Days to project ahead.
    #[arg(long, default_value_t = 30)]
    pub days: u32,
}

#[derive(Debug, Args, Clone)]
pub struct AddressArgs {
    /// Scholar address.
    pub address: String,

    /// Read recorded payloads from `<DIR>` instead of the network.
    #[arg(long, value_name = "DIR")]
    pub fixtures: Option<PathBuf>,
}
