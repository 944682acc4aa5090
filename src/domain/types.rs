//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - decoded from upstream payloads
//! - stored as opaque blobs in the result cache
//! - exported to JSON/CSV for downstream dashboards

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Length of a claim cycle, in seconds.
pub const CLAIM_CYCLE_SECS: i64 = 14 * 86_400;

/// Cumulative lifetime total measured at the start of a UTC day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySnapshot {
    pub day: NaiveDate,
    pub total_accrued: i64,
}

impl DailySnapshot {
    pub fn new(day: NaiveDate, total_accrued: i64) -> Self {
        Self { day, total_accrued }
    }
}

/// Balances of one scholar as reported by the game API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScholarRecord {
    /// In-game balance accrued since the last claim.
    pub current_balance: i64,
    /// Balance already claimed into the wallet.
    pub withdrawable_balance: i64,
    /// Lifetime counter. Claims never reset it.
    pub total_accrued: i64,
    /// Unix seconds of the last claim, 0 if never claimed.
    pub last_claim_epoch: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitiveRecord {
    pub rating: i64,
    pub rank: i64,
}

/// Competitive sub-record with "no data" kept apart from "fetch failed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", content = "record", rename_all = "snake_case")]
pub enum CompetitiveData {
    Present(CompetitiveRecord),
    #[default]
    Absent,
    FetchFailed,
}

impl CompetitiveData {
    pub fn record(&self) -> Option<&CompetitiveRecord> {
        match self {
            CompetitiveData::Present(record) => Some(record),
            CompetitiveData::Absent | CompetitiveData::FetchFailed => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CompetitiveData::FetchFailed)
    }
}

/// Daily snapshots around "now".
///
/// `yesterday` / `today` are convenience pointers; they may or may not also
/// appear inside `dates`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HistoricalWindow {
    pub yesterday: Option<DailySnapshot>,
    pub today: Option<DailySnapshot>,
    /// Ascending by day, at most one entry per day, gaps possible.
    pub dates: Vec<DailySnapshot>,
}

/// Everything fetched for one scholar in a single upstream round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScholarData {
    pub address: String,
    pub record: ScholarRecord,
    pub history: HistoricalWindow,
    pub competitive: CompetitiveData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AggregationOptions {
    /// Fold the still-accumulating current day into the daily average.
    pub include_today_in_average: bool,
}

/// Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedMetrics {
    pub current_balance: i64,
    pub withdrawable_balance: i64,
    pub total_accrued: i64,
    pub yesterday_delta: Option<i64>,
    pub today_delta: Option<i64>,
    pub last_claim_epoch: i64,
    /// 0 when the scholar never claimed.
    pub next_claim_epoch: i64,
    pub average_per_day: i64,
    pub competitive_rating: i64,
    pub competitive_rank: i64,
    pub competitive_errored: bool,
    pub loaded: bool,
    pub errored: bool,
}

impl AggregatedMetrics {
    pub fn has_claimed(&self) -> bool {
        self.last_claim_epoch != 0
    }

    pub fn last_claim_at(&self) -> Option<DateTime<Utc>> {
        if !self.has_claimed() {
            return None;
        }
        DateTime::from_timestamp(self.last_claim_epoch, 0)
    }

    pub fn next_claim_at(&self) -> Option<DateTime<Utc>> {
        if self.next_claim_epoch == 0 {
            return None;
        }
        DateTime::from_timestamp(self.next_claim_epoch, 0)
    }
}

/// Daily PvE progress from the adventure stats endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdventureProgress {
    pub gained: i64,
    pub max: i64,
}

/// A tracked scholar as listed in the roster file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scholar {
    pub address: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub inactive: bool,
}

impl Scholar {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.address
        } else {
            &self.name
        }
    }
}
