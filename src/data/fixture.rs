//! Offline source reading recorded upstream payloads from a directory.
//!
//! Layout: `<dir>/<address>.json` for scholar payloads and
//! `<dir>/<address>.adventure.json` for adventure stats, both in the upstream
//! wire format.

use std::fs;
use std::path::{Path, PathBuf};

use crate::data::SnapshotSource;
use crate::data::upstream::{decode_adventure, decode_scholar};
use crate::domain::{AdventureProgress, ScholarData};
use crate::error::FetchError;

pub struct FixtureSource {
    dir: PathBuf,
}

impl FixtureSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read(&self, file_name: &str) -> Result<String, FetchError> {
        let path = self.dir.join(file_name);
        fs::read_to_string(&path).map_err(|e| FetchError::Transport {
            url: display(&path),
            message: e.to_string(),
        })
    }
}

impl SnapshotSource for FixtureSource {
    fn fetch_scholar(&self, address: &str) -> Result<ScholarData, FetchError> {
        let body = self.read(&format!("{address}.json"))?;
        decode_scholar(address, &body)
    }

    fn fetch_adventure(&self, address: &str) -> Result<AdventureProgress, FetchError> {
        let body = self.read(&format!("{address}.adventure.json"))?;
        decode_adventure(address, &body)
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
