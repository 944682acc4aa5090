//! `scholar-metrics` library crate.
//!
//! The binary (`scholar`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the aggregation, cache and fetch layers are reusable by other front-ends
//!   (a dashboard server, scheduled exports, etc.)

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod metrics;
pub mod report;
