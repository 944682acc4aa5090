//! Shared "metrics pipeline" logic used by every command.
//!
//! cache check -> throttled upstream fetch on miss -> cache store -> aggregation
//!
//! The commands can then focus on presentation (tables, rankings, exports).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::cache::{MemoryCache, ResultCache};
use crate::config::Settings;
use crate::data::SnapshotSource;
use crate::domain::{AdventureProgress, AggregatedMetrics, AggregationOptions, ScholarData};
use crate::error::FetchError;
use crate::metrics::aggregate_scholar;

pub const SCHOLAR_METRIC: &str = "scholar";
pub const ADVENTURE_METRIC: &str = "scholarAdventure";

/// Result of one scholar in a batch run.
#[derive(Debug, Clone)]
pub struct ScholarOutcome {
    pub address: String,
    pub result: Result<AggregatedMetrics, FetchError>,
}

pub struct MetricsService {
    source: Arc<dyn SnapshotSource>,
    cache: ResultCache,
}

impl MetricsService {
    pub fn new(source: Arc<dyn SnapshotSource>, cache: ResultCache) -> Self {
        Self { source, cache }
    }

    /// Service backed by the in-process cache configured in `settings`.
    pub fn with_settings(settings: &Settings, source: Arc<dyn SnapshotSource>) -> Self {
        let backend = Arc::new(MemoryCache::new(settings.cache_capacity));
        let cache = ResultCache::new(
            backend,
            settings.cache_ttl,
            settings.cache_schema_version.as_str(),
        );
        Self::new(source, cache)
    }

    /// Raw scholar data, served from cache when fresh.
    pub fn scholar_data(&self, address: &str, now: DateTime<Utc>) -> Result<ScholarData, FetchError> {
        let key = self.cache.key(SCHOLAR_METRIC, address, now);
        self.cache
            .get_or_fetch(&key, || self.source.fetch_scholar(address))
    }

    pub fn compute_metrics(
        &self,
        address: &str,
        options: AggregationOptions,
    ) -> Result<AggregatedMetrics, FetchError> {
        self.compute_metrics_at(address, options, Utc::now())
    }

    pub fn compute_metrics_at(
        &self,
        address: &str,
        options: AggregationOptions,
        now: DateTime<Utc>,
    ) -> Result<AggregatedMetrics, FetchError> {
        let data = self.scholar_data(address, now)?;
        Ok(aggregate_scholar(&data, options, now))
    }

    /// Compute metrics for many scholars in parallel; order follows `addresses`.
    ///
    /// Individual failures are kept in their outcome and do not stop the batch.
    pub fn compute_batch(
        &self,
        addresses: &[String],
        options: AggregationOptions,
        now: DateTime<Utc>,
    ) -> Vec<ScholarOutcome> {
        let outcomes: Vec<ScholarOutcome> = addresses
            .par_iter()
            .map(|address| ScholarOutcome {
                address: address.clone(),
                result: self.compute_metrics_at(address, options, now),
            })
            .collect();

        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        for outcome in &outcomes {
            if let Err(err) = &outcome.result {
                warn!(address = %outcome.address, error = %err, "scholar fetch failed");
            }
        }
        info!(total = outcomes.len(), failed, "batch computed");

        outcomes
    }

    pub fn adventure(&self, address: &str, now: DateTime<Utc>) -> Result<AdventureProgress, FetchError> {
        let key = self.cache.key(ADVENTURE_METRIC, address, now);
        self.cache
            .get_or_fetch(&key, || self.source.fetch_adventure(address))
    }
}
