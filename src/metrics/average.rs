//! Average earnings per day since the last claim.
//!
//! The windowed average walks `dates` as (predecessor, entry) pairs and only
//! credits pairs that are one calendar day apart and lie after the claim day.
//! When no pair qualifies, the fallback divides the current balance by the
//! number of (started) days since the claim.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::domain::{AggregationOptions, DailySnapshot};

/// A last entry older than this (relative to now) is not used as a baseline
/// when it predates the claim.
const FRESH_BASELINE_HOURS: i64 = 30;

/// Running `(sum_of_deltas, day_count)` accumulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DailyAverage {
    pub total: i64,
    pub days: i64,
}

impl DailyAverage {
    fn credit(self, amount: i64, days: i64) -> Self {
        Self {
            total: self.total + amount,
            days: self.days + days,
        }
    }

    /// Floored average, `None` when nothing was credited.
    pub fn per_day(&self) -> Option<i64> {
        if self.days > 0 {
            Some(self.total.div_euclid(self.days))
        } else {
            None
        }
    }
}

/// UTC calendar day on which the claim happened.
///
/// Entries dated on or before this day start before the claim's end of day.
pub fn claim_day(last_claim_epoch: i64) -> NaiveDate {
    DateTime::from_timestamp(last_claim_epoch, 0)
        .map(|at| at.date_naive())
        .unwrap_or(NaiveDate::MIN)
}

/// Whole hours elapsed between the start of `day` (UTC) and `now`.
pub fn hours_since_day_start(day: NaiveDate, now: DateTime<Utc>) -> i64 {
    let start = day.and_time(NaiveTime::MIN).and_utc();
    (now - start).num_hours()
}

/// Contiguity-aware average over consecutive daily snapshots.
///
/// With `include_today_in_average`, the final pair also credits today's
/// partial accrual (`total_accrued - entry`) and counts as two days. That
/// weighting is kept as-is even though it lowers the average early in the day.
pub fn windowed_average(
    dates: &[DailySnapshot],
    total_accrued: i64,
    last_claim_epoch: i64,
    options: AggregationOptions,
    now: DateTime<Utc>,
) -> DailyAverage {
    let boundary = claim_day(last_claim_epoch);
    let last_index = dates.len().saturating_sub(1);

    dates
        .iter()
        .zip(dates.iter().skip(1))
        .enumerate()
        .fold(DailyAverage::default(), |acc, (idx, (prev, entry))| {
            let is_last = idx + 1 == last_index;

            if entry.day <= boundary {
                // Pre-claim snapshot: only a fresh final entry is usable as a baseline.
                if is_last && hours_since_day_start(entry.day, now) <= FRESH_BASELINE_HOURS {
                    return acc.credit(total_accrued - entry.total_accrued, 1);
                }
                return acc;
            }

            if prev.day.succ_opt() != Some(entry.day) {
                return acc;
            }

            let delta = entry.total_accrued - prev.total_accrued;
            if options.include_today_in_average && is_last {
                return acc.credit(delta + (total_accrued - entry.total_accrued), 2);
            }

            acc.credit(delta, 1)
        })
}

/// Number of started days since the claim, never below 1.
pub fn days_since_claim(last_claim_epoch: i64, now: DateTime<Utc>) -> i64 {
    let hours = (now.timestamp() - last_claim_epoch).div_euclid(3_600);
    let hours = hours.max(1);
    (hours + 23) / 24
}

/// `floor(balance / days_since_claim)`.
pub fn fallback_average(current_balance: i64, last_claim_epoch: i64, now: DateTime<Utc>) -> i64 {
    current_balance.div_euclid(days_since_claim(last_claim_epoch, now))
}
