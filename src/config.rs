//! Runtime settings from the environment (`.env` supported).

use std::num::NonZeroU32;
use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_ADVENTURE_API_URL: &str = "https://game-api.skymavis.com/game-api";

/// Cache entries must expire before the day bucket rotates.
const MAX_CACHE_TTL_SECS: u64 = 24 * 60 * 60 - 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamSettings {
    pub base_url: String,
    pub requests_per_second: NonZeroU32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// `None` is fine for offline (fixture) runs.
    pub scholar_api: Option<UpstreamSettings>,
    pub adventure_api: UpstreamSettings,
    pub timeout: Duration,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    pub cache_schema_version: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from any variable lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let scholar_api = match get("SCHOLAR_API_URL") {
            Some(base_url) => Some(UpstreamSettings {
                base_url,
                requests_per_second: rps(get("SCHOLAR_API_RPS"), "SCHOLAR_API_RPS", 100)?,
            }),
            None => None,
        };

        let adventure_api = UpstreamSettings {
            base_url: get("ADVENTURE_API_URL").unwrap_or_else(|| DEFAULT_ADVENTURE_API_URL.to_string()),
            requests_per_second: rps(get("ADVENTURE_API_RPS"), "ADVENTURE_API_RPS", 50)?,
        };

        Ok(Self {
            scholar_api,
            adventure_api,
            timeout: Duration::from_secs(number(get("UPSTREAM_TIMEOUT_SECS"), "UPSTREAM_TIMEOUT_SECS", 15)?),
            cache_ttl: cache_ttl(get("CACHE_TTL_SECS"))?,
            cache_capacity: number(get("CACHE_CAPACITY"), "CACHE_CAPACITY", 10_000)? as usize,
            cache_schema_version: get("CACHE_SCHEMA_VERSION").unwrap_or_else(|| "v1".to_string()),
        })
    }

    pub fn require_scholar_api(&self) -> Result<&UpstreamSettings, AppError> {
        self.scholar_api.as_ref().ok_or_else(|| {
            AppError::config("Missing SCHOLAR_API_URL in environment (.env); or pass --fixtures <DIR>.")
        })
    }
}

fn number(raw: Option<String>, name: &str, default: u64) -> Result<u64, AppError> {
    match raw {
        None => Ok(default),
        Some(v) => v
            .parse::<u64>()
            .map_err(|e| AppError::config(format!("Invalid {name} '{v}': {e}"))),
    }
}

fn cache_ttl(raw: Option<String>) -> Result<Duration, AppError> {
    match number(raw, "CACHE_TTL_SECS", 15 * 60)? {
        secs @ 1..=MAX_CACHE_TTL_SECS => Ok(Duration::from_secs(secs)),
        _ => Err(AppError::config(format!(
            "CACHE_TTL_SECS must be between 1 and {MAX_CACHE_TTL_SECS}"
        ))),
    }
}

fn rps(raw: Option<String>, name: &str, default: u32) -> Result<NonZeroU32, AppError> {
    let value = number(raw, name, u64::from(default))?;
    u32::try_from(value)
        .ok()
        .and_then(NonZeroU32::new)
        .ok_or_else(|| AppError::config(format!("{name} must be between 1 and {}", u32::MAX)))
}
