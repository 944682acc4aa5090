//! Upstream data access.
//!
//! - `SnapshotSource`: the fetch contract the service layer depends on
//! - `client`: throttled, time-bounded HTTP implementation
//! - `fixture`: offline implementation over recorded payloads
//! - `throttle`: per-host request ceilings
//! - `upstream`: wire decoding

use crate::domain::{AdventureProgress, ScholarData};
use crate::error::FetchError;

pub mod client;
pub mod fixture;
pub mod throttle;
pub mod upstream;

pub use client::HttpSnapshotClient;
pub use fixture::FixtureSource;
pub use throttle::{Throttle, ThrottleRegistry};

/// Raw per-scholar data provider. Implementations must be safe to call from
/// many threads at once.
pub trait SnapshotSource: Send + Sync {
    fn fetch_scholar(&self, address: &str) -> Result<ScholarData, FetchError>;
    fn fetch_adventure(&self, address: &str) -> Result<AdventureProgress, FetchError>;
}
