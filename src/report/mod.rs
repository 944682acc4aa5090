//! Dashboard aggregates over a batch of computed metrics.
//!
//! - notable performers (top / bottom by average per day)
//! - closest upcoming claim
//! - earnings forecast
//! - terminal formatting (`format`)

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::domain::{AggregatedMetrics, Scholar};

pub mod format;

pub use format::*;

/// A roster entry joined with its computed metrics.
#[derive(Debug, Clone)]
pub struct ScholarRow {
    pub scholar: Scholar,
    pub metrics: AggregatedMetrics,
}

/// Top and bottom performers (N each side).
#[derive(Debug, Clone)]
pub struct Performers {
    pub top: Vec<ScholarRow>,
    pub bottom: Vec<ScholarRow>,
}

/// Rank active scholars by average per day.
///
/// Scholars that never claimed, or claimed less than a full day ago, have no
/// meaningful average yet and are left out.
pub fn notable_performers(rows: &[ScholarRow], top_n: usize, now: DateTime<Utc>) -> Performers {
    let mut ranked: Vec<ScholarRow> = rows
        .iter()
        .filter(|row| !row.scholar.inactive)
        .filter(|row| {
            row.metrics
                .last_claim_at()
                .is_some_and(|claimed| now > claimed + Duration::days(1))
        })
        .cloned()
        .collect();
    ranked.sort_by(|a, b| b.metrics.average_per_day.cmp(&a.metrics.average_per_day));

    let top = ranked.iter().take(top_n).cloned().collect();
    let bottom = ranked.iter().rev().take(top_n).cloned().collect();

    Performers { top, bottom }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextClaim {
    pub address: String,
    pub at: DateTime<Utc>,
}

/// Earliest next claim among scholars that have claimed at least once.
pub fn closest_next_claim(rows: &[ScholarRow]) -> Option<NextClaim> {
    rows.iter()
        .filter_map(|row| {
            row.metrics.next_claim_at().map(|at| NextClaim {
                address: row.scholar.address.clone(),
                at,
            })
        })
        .min_by_key(|claim| claim.at)
}

/// "now" once eligible, otherwise the remaining time (e.g. "in 3d 4h").
pub fn describe_until(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    if at <= now {
        return "now".to_string();
    }
    let left = at - now;
    let days = left.num_days();
    let hours = left.num_hours() - days * 24;
    let minutes = left.num_minutes() - left.num_hours() * 60;
    match (days, hours) {
        (0, 0) => format!("in {minutes}m"),
        (0, h) => format!("in {h}h {minutes}m"),
        (d, h) => format!("in {d}d {h}h"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForecastPoint {
    pub day: NaiveDate,
    pub projected: i64,
}

/// Projected combined balance for `today..=today + days`, assuming every
/// scholar keeps their current average and nobody claims.
pub fn earnings_forecast<'a, I>(metrics: I, today: NaiveDate, days: u32) -> Vec<ForecastPoint>
where
    I: IntoIterator<Item = &'a AggregatedMetrics>,
{
    let (balance, per_day) = metrics.into_iter().fold((0_i64, 0_i64), |(balance, per_day), m| {
        (balance + m.current_balance, per_day + m.average_per_day)
    });

    (0..=days)
        .filter_map(|offset| {
            let day = today.checked_add_days(chrono::Days::new(u64::from(offset)))?;
            Some(ForecastPoint {
                day,
                projected: balance + per_day * i64::from(offset),
            })
        })
        .collect()
}
