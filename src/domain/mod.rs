//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - upstream inputs (`ScholarRecord`, `HistoricalWindow`, `CompetitiveData`)
//! - the per-scholar fetch bundle (`ScholarData`)
//! - aggregation options and outputs (`AggregationOptions`, `AggregatedMetrics`)

pub mod types;

pub use types::*;
