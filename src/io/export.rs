//! Export per-scholar metrics to CSV or JSON.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::domain::AggregatedMetrics;
use crate::error::AppError;
use crate::report::ScholarRow;

#[derive(Serialize)]
struct ExportRow<'a> {
    address: &'a str,
    name: &'a str,
    #[serde(flatten)]
    metrics: &'a AggregatedMetrics,
}

/// Write per-scholar metrics to a CSV file.
pub fn write_metrics_csv(path: &Path, rows: &[ScholarRow]) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writeln!(
        file,
        "address,name,current_balance,withdrawable_balance,total_accrued,yesterday_delta,today_delta,average_per_day,last_claim_epoch,next_claim_epoch,competitive_rating,competitive_rank,competitive_errored"
    )
    .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for row in rows {
        let m = &row.metrics;
        writeln!(
            file,
            "{},{},{},{},{},{},{},{},{},{},{},{},{}",
            csv_field(&row.scholar.address),
            csv_field(&row.scholar.name),
            m.current_balance,
            m.withdrawable_balance,
            m.total_accrued,
            m.yesterday_delta.map(|v| v.to_string()).unwrap_or_default(),
            m.today_delta.map(|v| v.to_string()).unwrap_or_default(),
            m.average_per_day,
            m.last_claim_epoch,
            m.next_claim_epoch,
            m.competitive_rating,
            m.competitive_rank,
            m.competitive_errored,
        )
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

/// Write per-scholar metrics as a pretty-printed JSON array.
pub fn write_metrics_json(path: &Path, rows: &[ScholarRow]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export JSON '{}': {e}", path.display())))?;

    let export: Vec<ExportRow<'_>> = rows
        .iter()
        .map(|row| ExportRow {
            address: &row.scholar.address,
            name: &row.scholar.name,
            metrics: &row.metrics,
        })
        .collect();

    serde_json::to_writer_pretty(file, &export)
        .map_err(|e| AppError::new(2, format!("Failed to write export JSON: {e}")))?;

    Ok(())
}

fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}
