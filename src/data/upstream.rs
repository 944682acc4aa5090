//! Decoding of upstream payloads into domain types.
//!
//! Only the consumed fields are modelled. Anything required that is missing
//! or out of range surfaces as `FetchError::MalformedUpstreamPayload`.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};

use crate::domain::{
    AdventureProgress, CompetitiveData, CompetitiveRecord, DailySnapshot, HistoricalWindow,
    ScholarData, ScholarRecord,
};
use crate::error::FetchError;

#[derive(Debug, Deserialize)]
struct ScholarResponse {
    scholar: Option<WireScholar>,
    historical: Option<WireHistorical>,
    /// Missing: no competitive history. `null`: the upstream failed to load it.
    #[serde(default, deserialize_with = "present_or_null")]
    pvp: Option<Option<WirePvp>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireScholar {
    slp: i64,
    ronin_slp: i64,
    total_slp: i64,
    #[serde(default)]
    last_claim: i64,
}

#[derive(Debug, Default, Deserialize)]
struct WireHistorical {
    yesterday: Option<WireSnapshot>,
    today: Option<WireSnapshot>,
    #[serde(default)]
    dates: Vec<WireSnapshot>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSnapshot {
    day: String,
    total_slp: i64,
}

#[derive(Debug, Deserialize)]
struct WirePvp {
    elo: i64,
    rank: i64,
}

#[derive(Debug, Deserialize)]
struct AdventureResponse {
    gained_slp_response: WireGained,
}

#[derive(Debug, Deserialize)]
struct WireGained {
    gained_slp: i64,
    max_slp: i64,
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Decode a scholar payload (balances + history + optional competitive data).
pub fn decode_scholar(address: &str, body: &str) -> Result<ScholarData, FetchError> {
    let resp: ScholarResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::malformed(address, format!("invalid JSON: {e}")))?;

    let scholar = resp
        .scholar
        .ok_or_else(|| FetchError::malformed(address, "missing `scholar` record"))?;
    let historical = resp
        .historical
        .ok_or_else(|| FetchError::malformed(address, "missing `historical` window"))?;

    if scholar.slp < 0 || scholar.ronin_slp < 0 || scholar.total_slp < 0 {
        return Err(FetchError::malformed(address, "negative balance"));
    }
    if scholar.last_claim < 0 {
        return Err(FetchError::malformed(address, "negative `lastClaim`"));
    }
    if DateTime::from_timestamp(scholar.last_claim, 0).is_none() {
        return Err(FetchError::malformed(
            address,
            format!("`lastClaim` {} is out of range", scholar.last_claim),
        ));
    }

    let record = ScholarRecord {
        current_balance: scholar.slp,
        withdrawable_balance: scholar.ronin_slp,
        total_accrued: scholar.total_slp,
        last_claim_epoch: scholar.last_claim,
    };

    let convert = |snap: WireSnapshot| snapshot(address, snap);
    let yesterday = historical.yesterday.map(convert).transpose()?;
    let today = historical.today.map(convert).transpose()?;
    let mut dates = historical
        .dates
        .into_iter()
        .map(convert)
        .collect::<Result<Vec<_>, _>>()?;
    dates.sort_by_key(|s| s.day);
    dates.dedup_by_key(|s| s.day);

    let competitive = match resp.pvp {
        None => CompetitiveData::Absent,
        Some(None) => CompetitiveData::FetchFailed,
        Some(Some(pvp)) => CompetitiveData::Present(CompetitiveRecord {
            rating: pvp.elo,
            rank: pvp.rank,
        }),
    };

    Ok(ScholarData {
        address: address.to_string(),
        record,
        history: HistoricalWindow {
            yesterday,
            today,
            dates,
        },
        competitive,
    })
}

pub fn decode_adventure(address: &str, body: &str) -> Result<AdventureProgress, FetchError> {
    let resp: AdventureResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::malformed(address, format!("invalid adventure JSON: {e}")))?;
    Ok(AdventureProgress {
        gained: resp.gained_slp_response.gained_slp,
        max: resp.gained_slp_response.max_slp,
    })
}

fn snapshot(address: &str, snap: WireSnapshot) -> Result<DailySnapshot, FetchError> {
    if snap.total_slp < 0 {
        return Err(FetchError::malformed(
            address,
            format!("negative total on {}", snap.day),
        ));
    }
    let day = parse_day(&snap.day)
        .ok_or_else(|| FetchError::malformed(address, format!("invalid day '{}'", snap.day)))?;
    Ok(DailySnapshot::new(day, snap.total_slp))
}

/// `YYYY-MM-DD`, or an RFC 3339 timestamp reduced to its UTC date.
fn parse_day(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if let Ok(day) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(day);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|at| at.naive_utc().date())
}
