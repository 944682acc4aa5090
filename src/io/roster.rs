//! Roster loading.
//!
//! The roster is a JSON array of `{ "address", "name", "inactive" }` objects.
//! Duplicate addresses keep their first entry.

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use tracing::warn;

use crate::domain::Scholar;
use crate::error::AppError;

pub fn read_roster(path: &Path) -> Result<Vec<Scholar>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open roster '{}': {e}", path.display())))?;
    let scholars: Vec<Scholar> = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid roster JSON '{}': {e}", path.display())))?;

    normalize_roster(scholars)
}

fn normalize_roster(scholars: Vec<Scholar>) -> Result<Vec<Scholar>, AppError> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(scholars.len());

    for (idx, mut scholar) in scholars.into_iter().enumerate() {
        scholar.address = scholar.address.trim().to_string();
        if scholar.address.is_empty() {
            return Err(AppError::new(2, format!("Roster entry #{} has an empty address.", idx + 1)));
        }
        if !seen.insert(scholar.address.clone()) {
            warn!(address = %scholar.address, "duplicate roster entry ignored");
            continue;
        }
        out.push(scholar);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reads_and_dedupes_roster() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.json");
        fs::write(
            &path,
            r#"[
                { "address": " ronin:a ", "name": "Ana" },
                { "address": "ronin:b", "name": "Bo", "inactive": true },
                { "address": "ronin:a", "name": "Dup" }
            ]"#,
        )
        .unwrap();

        let roster = read_roster(&path).unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].address, "ronin:a");
        assert_eq!(roster[0].name, "Ana");
        assert!(roster[1].inactive);
    }

    #[test]
    fn empty_address_is_a_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.json");
        fs::write(&path, r#"[{ "address": "" }]"#).unwrap();

        assert_eq!(read_roster(&path).unwrap_err().exit_code(), 2);
    }
}
