//! Versioned, day-bucketed cache keys.

use std::fmt;

use chrono::{DateTime, Datelike, Utc};

/// `{schema_version}:{metric}:{subject}:{day_bucket}`.
///
/// The bucket is the UTC day of the week (0 = Sunday), so a key rotates at
/// least once per day even when its TTL has not expired yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    version: String,
    metric: String,
    subject: String,
    bucket: u32,
}

impl CacheKey {
    pub fn new(
        version: impl Into<String>,
        metric: impl Into<String>,
        subject: impl Into<String>,
        bucket: u32,
    ) -> Self {
        Self {
            version: version.into(),
            metric: metric.into(),
            subject: subject.into(),
            bucket,
        }
    }

    /// Key for `now`'s day bucket.
    pub fn at(
        version: impl Into<String>,
        metric: impl Into<String>,
        subject: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self::new(version, metric, subject, day_bucket(now))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.version, self.metric, self.subject, self.bucket
        )
    }
}

pub fn day_bucket(now: DateTime<Utc>) -> u32 {
    now.weekday().num_days_from_sunday()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn key_shape_includes_weekday_bucket() {
        // 2021-10-17 was a Sunday.
        let sunday = Utc.with_ymd_and_hms(2021, 10, 17, 23, 59, 0).unwrap();
        let monday = Utc.with_ymd_and_hms(2021, 10, 18, 0, 1, 0).unwrap();

        let a = CacheKey::at("v1", "scholar", "ronin:abc", sunday);
        let b = CacheKey::at("v1", "scholar", "ronin:abc", monday);

        assert_eq!(a.to_string(), "v1:scholar:ronin:abc:0");
        assert_eq!(b.to_string(), "v1:scholar:ronin:abc:1");
        assert_ne!(a, b);
    }
}
