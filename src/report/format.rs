//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the aggregation code stays clean and testable
//! - output changes are localized

use chrono::{DateTime, Utc};

use crate::domain::AdventureProgress;
use crate::metrics::DailyEarning;
use crate::report::{ForecastPoint, NextClaim, Performers, ScholarRow, describe_until};

/// Per-scholar metrics table.
pub fn format_metrics_table(rows: &[ScholarRow], now: DateTime<Utc>) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<20} {:>8} {:>8} {:>9} {:>9} {:>8} {:<18} {:>7} {:>8}\n",
            "name", "balance", "per_day", "yesterday", "today", "ronin", "next_claim", "elo", "rank"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<20} {:-<8} {:-<8} {:-<9} {:-<9} {:-<8} {:-<18} {:-<7} {:-<8}\n",
            "", "", "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for row in rows {
        let m = &row.metrics;
        let next_claim = m
            .next_claim_at()
            .map(|at| describe_until(at, now))
            .unwrap_or_else(|| "-".to_string());
        let (elo, rank) = if m.competitive_errored {
            ("err".to_string(), "err".to_string())
        } else {
            (m.competitive_rating.to_string(), m.competitive_rank.to_string())
        };

        out.push_str(
            format!(
                "{:<20} {:>8} {:>8} {:>9} {:>9} {:>8} {:<18} {:>7} {:>8}\n",
                truncate(row.scholar.display_name(), 20),
                m.current_balance,
                m.average_per_day,
                fmt_opt(m.yesterday_delta),
                fmt_opt(m.today_delta),
                m.withdrawable_balance,
                next_claim,
                elo,
                rank,
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

/// Top / bottom performer tables.
pub fn format_performers(performers: &Performers) -> String {
    let mut out = String::new();

    out.push_str("Top performers (average per day):\n");
    out.push_str(&format_performer_table(&performers.top));
    out.push('\n');

    out.push_str("Bottom performers (average per day):\n");
    out.push_str(&format_performer_table(&performers.bottom));

    out
}

fn format_performer_table(rows: &[ScholarRow]) -> String {
    if rows.is_empty() {
        return "No data...\n".to_string();
    }

    let mut out = String::new();
    out.push_str(format!("{:<20} {:>8} {:>9} {:>7} {:>8}", "name", "per_day", "yesterday", "elo", "balance").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<20} {:-<8} {:-<9} {:-<7} {:-<8}", "", "", "", "", "").trim_end());
    out.push('\n');
    for row in rows {
        let m = &row.metrics;
        out.push_str(
            format!(
                "{:<20} {:>8} {:>9} {:>7} {:>8}",
                truncate(row.scholar.display_name(), 20),
                m.average_per_day,
                fmt_opt(m.yesterday_delta),
                m.competitive_rating,
                m.current_balance,
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

pub fn format_next_claim(next: Option<&NextClaim>, now: DateTime<Utc>) -> String {
    match next {
        None => "Your next claim is: -\n".to_string(),
        Some(claim) => format!(
            "Your next claim is {} ({}, {})\n",
            describe_until(claim.at, now),
            claim.at.format("%d %b %Y, %H:%M:%S UTC"),
            claim.address
        ),
    }
}

pub fn format_forecast(points: &[ForecastPoint]) -> String {
    let mut out = String::new();
    out.push_str("Earnings forecast (constant average, no claims):\n");
    for p in points {
        out.push_str(&format!("{}  {:>10}\n", p.day, p.projected));
    }
    out
}

pub fn format_adventure(address: &str, progress: &AdventureProgress) -> String {
    format!("{address}: adventure {}/{}\n", progress.gained, progress.max)
}

pub fn format_daily_earnings(address: &str, series: &[DailyEarning]) -> String {
    let mut out = format!("Daily earnings for {address}:\n");
    if series.is_empty() {
        out.push_str("No data...\n");
    }
    for e in series {
        out.push_str(&format!("{}  {:>8}\n", e.day, e.earned));
    }
    out
}

fn fmt_opt(value: Option<i64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::domain::{AggregatedMetrics, Scholar};

    fn metrics() -> AggregatedMetrics {
        AggregatedMetrics {
            current_balance: 420,
            withdrawable_balance: 1_000,
            total_accrued: 9_000,
            yesterday_delta: Some(130),
            today_delta: None,
            last_claim_epoch: 0,
            next_claim_epoch: 0,
            average_per_day: 120,
            competitive_rating: 0,
            competitive_rank: 0,
            competitive_errored: true,
            loaded: true,
            errored: false,
        }
    }

    #[test]
    fn table_marks_missing_values_and_failed_competitive_data() {
        let now = Utc.with_ymd_and_hms(2021, 10, 20, 12, 0, 0).unwrap();
        let rows = vec![ScholarRow {
            scholar: Scholar {
                address: "ronin:abc".to_string(),
                name: "A very long scholar name".to_string(),
                inactive: false,
            },
            metrics: metrics(),
        }];

        let table = format_metrics_table(&rows, now);
        let line = table.lines().nth(2).unwrap();
        assert!(line.starts_with("A very long scholar."));
        assert!(line.contains("130"));
        assert!(line.contains(" - "));
        assert!(line.ends_with("err"));
    }

    #[test]
    fn empty_performer_table_says_no_data() {
        let performers = Performers {
            top: vec![],
            bottom: vec![],
        };
        assert!(format_performers(&performers).contains("No data..."));
    }

    #[test]
    fn truncate_marks_cut_names() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 5), "abcd.");
    }
}
