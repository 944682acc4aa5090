//! Per-day earnings series for charting.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::DailySnapshot;

/// Earnings accrued during `day` (difference between the snapshot at the
/// start of `day` and the one at the start of the next day).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyEarning {
    pub day: NaiveDate,
    pub earned: i64,
}

/// Deltas for every contiguous pair in `dates`; gaps are left out.
pub fn daily_earnings(dates: &[DailySnapshot]) -> Vec<DailyEarning> {
    dates
        .iter()
        .zip(dates.iter().skip(1))
        .filter(|(prev, entry)| prev.day.succ_opt() == Some(entry.day))
        .map(|(prev, entry)| DailyEarning {
            day: prev.day,
            earned: entry.total_accrued - prev.total_accrued,
        })
        .collect()
}
