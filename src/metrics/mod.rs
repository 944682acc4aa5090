//! Earnings aggregation.
//!
//! Everything here is pure: inputs are already-fetched upstream data plus an
//! explicit `now`, outputs are plain values. Safe to call concurrently for any
//! number of scholars.

use chrono::{DateTime, Timelike, Utc};

use crate::domain::{
    AggregatedMetrics, AggregationOptions, CLAIM_CYCLE_SECS, CompetitiveData, HistoricalWindow,
    ScholarData, ScholarRecord,
};

pub mod average;
pub mod series;

pub use average::{DailyAverage, fallback_average, windowed_average};
pub use series::{DailyEarning, daily_earnings};

/// Latest UTC hour at which `total - yesterday` still stands in for
/// yesterday's full-day delta when today's snapshot is missing.
const YESTERDAY_PROXY_LAST_HOUR: u32 = 6;

/// Derive dashboard metrics for one scholar.
pub fn aggregate(
    record: &ScholarRecord,
    history: &HistoricalWindow,
    competitive: &CompetitiveData,
    options: AggregationOptions,
    now: DateTime<Utc>,
) -> AggregatedMetrics {
    let average_per_day = windowed_average(
        &history.dates,
        record.total_accrued,
        record.last_claim_epoch,
        options,
        now,
    )
    .per_day()
    .unwrap_or_else(|| fallback_average(record.current_balance, record.last_claim_epoch, now));

    let (competitive_rating, competitive_rank) = competitive
        .record()
        .map(|r| (r.rating, r.rank))
        .unwrap_or((0, 0));

    AggregatedMetrics {
        current_balance: record.current_balance,
        withdrawable_balance: record.withdrawable_balance,
        total_accrued: record.total_accrued,
        yesterday_delta: yesterday_delta(record, history, now),
        today_delta: today_delta(record, history),
        last_claim_epoch: record.last_claim_epoch,
        next_claim_epoch: next_claim_epoch(record.last_claim_epoch),
        average_per_day,
        competitive_rating,
        competitive_rank,
        competitive_errored: competitive.is_failed(),
        loaded: true,
        errored: false,
    }
}

/// [`aggregate`] over a fetched bundle.
pub fn aggregate_scholar(
    data: &ScholarData,
    options: AggregationOptions,
    now: DateTime<Utc>,
) -> AggregatedMetrics {
    aggregate(&data.record, &data.history, &data.competitive, options, now)
}

pub fn next_claim_epoch(last_claim_epoch: i64) -> i64 {
    if last_claim_epoch == 0 {
        0
    } else {
        last_claim_epoch.saturating_add(CLAIM_CYCLE_SECS)
    }
}

/// Accrued so far today; today's snapshot is the balance at the start of the day.
pub fn today_delta(record: &ScholarRecord, history: &HistoricalWindow) -> Option<i64> {
    history
        .today
        .map(|today| record.total_accrued - today.total_accrued)
}

pub fn yesterday_delta(
    record: &ScholarRecord,
    history: &HistoricalWindow,
    now: DateTime<Utc>,
) -> Option<i64> {
    let yesterday = history.yesterday?;
    match history.today {
        Some(today) => Some(today.total_accrued - yesterday.total_accrued),
        None if now.hour() <= YESTERDAY_PROXY_LAST_HOUR => {
            Some(record.total_accrued - yesterday.total_accrued)
        }
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    use crate::domain::{CompetitiveRecord, DailySnapshot};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 10, day).unwrap()
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 10, day, hour, 0, 0).unwrap()
    }

    fn record(total: i64, last_claim_epoch: i64) -> ScholarRecord {
        ScholarRecord {
            current_balance: total,
            withdrawable_balance: 12,
            total_accrued: total,
            last_claim_epoch,
        }
    }

    #[test]
    fn next_claim_is_zero_when_never_claimed() {
        assert_eq!(next_claim_epoch(0), 0);
        let m = aggregate(
            &record(10, 0),
            &HistoricalWindow::default(),
            &CompetitiveData::Absent,
            AggregationOptions::default(),
            at(15, 12),
        );
        assert_eq!(m.next_claim_epoch, 0);
        assert_eq!(m.next_claim_at(), None);
    }

    #[test]
    fn next_claim_is_fourteen_days_after_claim() {
        let t = 1_634_000_000;
        assert_eq!(next_claim_epoch(t), t + 14 * 86_400);
    }

    #[test]
    fn next_claim_saturates_for_far_future_claims() {
        assert_eq!(next_claim_epoch(i64::MAX), i64::MAX);
        let m = aggregate(
            &record(10, i64::MAX - 1),
            &HistoricalWindow::default(),
            &CompetitiveData::Absent,
            AggregationOptions::default(),
            at(15, 12),
        );
        assert_eq!(m.next_claim_epoch, i64::MAX);
        assert_eq!(m.next_claim_at(), None);
    }

    #[test]
    fn today_and_yesterday_deltas_with_both_snapshots() {
        let history = HistoricalWindow {
            yesterday: Some(DailySnapshot::new(d(14), 1_000)),
            today: Some(DailySnapshot::new(d(15), 1_120)),
            dates: vec![],
        };
        let rec = record(1_150, 0);
        assert_eq!(today_delta(&rec, &history), Some(30));
        assert_eq!(yesterday_delta(&rec, &history, at(15, 20)), Some(120));
    }

    #[test]
    fn yesterday_proxy_only_applies_early_in_the_day() {
        let history = HistoricalWindow {
            yesterday: Some(DailySnapshot::new(d(14), 1_000)),
            today: None,
            dates: vec![],
        };
        let rec = record(1_090, 0);
        assert_eq!(today_delta(&rec, &history), None);
        assert_eq!(yesterday_delta(&rec, &history, at(15, 6)), Some(90));
        assert_eq!(yesterday_delta(&rec, &history, at(15, 7)), None);
    }

    #[test]
    fn yesterday_is_none_without_yesterday_snapshot() {
        let history = HistoricalWindow {
            yesterday: None,
            today: Some(DailySnapshot::new(d(15), 1_000)),
            dates: vec![],
        };
        assert_eq!(yesterday_delta(&record(1_050, 0), &history, at(15, 3)), None);
    }

    #[test]
    fn windowed_average_wins_over_fallback() {
        let history = HistoricalWindow {
            yesterday: None,
            today: None,
            dates: vec![DailySnapshot::new(d(13), 100), DailySnapshot::new(d(14), 150)],
        };
        let m = aggregate(
            &record(150, 0),
            &history,
            &CompetitiveData::Absent,
            AggregationOptions::default(),
            at(14, 12),
        );
        assert_eq!(m.average_per_day, 50);
    }

    #[test]
    fn empty_history_falls_back_to_balance_over_days() {
        let now = at(20, 9);
        let claim = now.timestamp() - 7 * 86_400;
        let m = aggregate(
            &record(700, claim),
            &HistoricalWindow::default(),
            &CompetitiveData::Absent,
            AggregationOptions::default(),
            now,
        );
        assert_eq!(m.average_per_day, 100);
        assert_eq!(m.next_claim_epoch, claim + 14 * 86_400);
    }

    #[test]
    fn competitive_failure_is_flagged_not_zeroed_silently() {
        let failed = aggregate(
            &record(0, 0),
            &HistoricalWindow::default(),
            &CompetitiveData::FetchFailed,
            AggregationOptions::default(),
            at(15, 12),
        );
        assert!(failed.competitive_errored);
        assert_eq!((failed.competitive_rating, failed.competitive_rank), (0, 0));

        let absent = aggregate(
            &record(0, 0),
            &HistoricalWindow::default(),
            &CompetitiveData::Absent,
            AggregationOptions::default(),
            at(15, 12),
        );
        assert!(!absent.competitive_errored);

        let present = aggregate(
            &record(0, 0),
            &HistoricalWindow::default(),
            &CompetitiveData::Present(CompetitiveRecord { rating: 1_450, rank: 8_812 }),
            AggregationOptions::default(),
            at(15, 12),
        );
        assert_eq!((present.competitive_rating, present.competitive_rank), (1_450, 8_812));
        assert!(!present.competitive_errored);
    }

    #[test]
    fn output_is_marked_loaded() {
        let m = aggregate(
            &record(5, 0),
            &HistoricalWindow::default(),
            &CompetitiveData::Absent,
            AggregationOptions::default(),
            at(15, 12),
        );
        assert!(m.loaded);
        assert!(!m.errored);
        assert_eq!(m.withdrawable_balance, 12);
    }
}
