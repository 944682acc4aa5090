//! HTTP access to the game APIs.
//!
//! Every request passes through the throttle of its host first, is bounded by
//! the configured timeout, and is never retried here.

use std::sync::Arc;
use std::time::Instant;

use reqwest::Url;
use reqwest::blocking::Client;
use tracing::debug;

use crate::config::{Settings, UpstreamSettings};
use crate::data::throttle::{Throttle, ThrottleRegistry};
use crate::data::upstream::{decode_adventure, decode_scholar};
use crate::data::SnapshotSource;
use crate::domain::{AdventureProgress, ScholarData};
use crate::error::{AppError, FetchError};

struct Endpoint {
    base_url: Url,
    throttle: Arc<Throttle>,
}

impl Endpoint {
    fn new(settings: &UpstreamSettings, throttles: &ThrottleRegistry) -> Result<Self, AppError> {
        let url = Url::parse(&settings.base_url)
            .map_err(|e| AppError::config(format!("Invalid upstream URL '{}': {e}", settings.base_url)))?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(AppError::config(format!(
                    "Upstream URL '{}' has no host.",
                    settings.base_url
                )));
            }
        };

        Ok(Self {
            throttle: throttles.for_host(&host, settings.requests_per_second),
            base_url: url,
        })
    }

    /// Base URL extended by `segments`, each percent-encoded as one path segment.
    fn url(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| FetchError::Transport {
                url: self.base_url.to_string(),
                message: "upstream URL cannot take a path".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

pub struct HttpSnapshotClient {
    client: Client,
    scholar_api: Option<Endpoint>,
    adventure_api: Endpoint,
}

impl HttpSnapshotClient {
    pub fn new(settings: &Settings, throttles: &ThrottleRegistry) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| AppError::config(format!("Failed to build HTTP client: {e}")))?;

        let scholar_api = settings
            .scholar_api
            .as_ref()
            .map(|api| Endpoint::new(api, throttles))
            .transpose()?;

        Ok(Self {
            client,
            scholar_api,
            adventure_api: Endpoint::new(&settings.adventure_api, throttles)?,
        })
    }

    fn get_text(
        &self,
        endpoint: &Endpoint,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<String, FetchError> {
        let target = endpoint.url(segments)?;
        let url = target.to_string();
        endpoint.throttle.acquire();

        let started = Instant::now();
        debug!(%url, "upstream request");
        let resp = self
            .client
            .get(target)
            .query(query)
            .send()
            .map_err(|e| transport_error(&url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::UpstreamHttp {
                url,
                status: status.as_u16(),
            });
        }

        let body = resp.text().map_err(|e| transport_error(&url, e))?;
        debug!(%url, elapsed_ms = elapsed_ms(started), "upstream response");
        Ok(body)
    }
}

impl SnapshotSource for HttpSnapshotClient {
    fn fetch_scholar(&self, address: &str) -> Result<ScholarData, FetchError> {
        let endpoint = self.scholar_api.as_ref().ok_or_else(|| FetchError::Transport {
            url: format!("scholars/{address}"),
            message: "scholar API is not configured".to_string(),
        })?;
        let body = self.get_text(endpoint, &["scholars", address], &[])?;
        decode_scholar(address, &body)
    }

    fn fetch_adventure(&self, address: &str) -> Result<AdventureProgress, FetchError> {
        let segments = ["clients", address, "pve-best-scores", "worlds", "1", "pve-stats"];
        let body = self.get_text(&self.adventure_api, &segments, &[("offset", "0"), ("limit", "0")])?;
        decode_adventure(address, &body)
    }
}

fn transport_error(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::UpstreamTimeout {
            url: url.to_string(),
        }
    } else if let Some(status) = err.status() {
        FetchError::UpstreamHttp {
            url: url.to_string(),
            status: status.as_u16(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    /// One-shot HTTP server answering the first request with `status` and `body`.
    fn serve_once(status: &'static str, body: &'static str, delay: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0_u8; 2048];
                let _ = stream.read(&mut buf);
                thread::sleep(delay);
                let resp = format!(
                    "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(resp.as_bytes());
            }
        });
        format!("http://{addr}")
    }

    fn client(base_url: String, timeout: Duration) -> HttpSnapshotClient {
        let upstream = UpstreamSettings {
            base_url: base_url.clone(),
            requests_per_second: std::num::NonZeroU32::new(100).unwrap(),
        };
        let settings = Settings {
            scholar_api: Some(upstream.clone()),
            adventure_api: upstream,
            timeout,
            cache_ttl: Duration::from_secs(60),
            cache_capacity: 10,
            cache_schema_version: "v1".to_string(),
        };
        HttpSnapshotClient::new(&settings, &ThrottleRegistry::new()).unwrap()
    }

    #[test]
    fn decodes_successful_response() {
        let body = r#"{"scholar":{"slp":10,"roninSlp":0,"totalSlp":10,"lastClaim":0},"historical":{"dates":[]}}"#;
        let base = serve_once("200 OK", body, Duration::ZERO);
        let data = client(base, Duration::from_secs(5)).fetch_scholar("ronin:abc").unwrap();
        assert_eq!(data.record.total_accrued, 10);
        assert_eq!(data.address, "ronin:abc");
    }

    #[test]
    fn non_success_status_is_typed() {
        let base = serve_once("503 Service Unavailable", "{}", Duration::ZERO);
        let err = client(base, Duration::from_secs(5)).fetch_adventure("ronin:abc").unwrap_err();
        assert!(matches!(err, FetchError::UpstreamHttp { status: 503, .. }), "{err:?}");
    }

    #[test]
    fn slow_upstream_times_out() {
        let base = serve_once("200 OK", "{}", Duration::from_millis(1_500));
        let err = client(base, Duration::from_millis(200))
            .fetch_scholar("ronin:abc")
            .unwrap_err();
        assert!(matches!(err, FetchError::UpstreamTimeout { .. }), "{err:?}");
    }

    #[test]
    fn address_stays_inside_its_path_segment() {
        let upstream = UpstreamSettings {
            base_url: "https://tracker.example/api/game/".to_string(),
            requests_per_second: std::num::NonZeroU32::new(10).unwrap(),
        };
        let endpoint = Endpoint::new(&upstream, &ThrottleRegistry::new()).unwrap();

        let url = endpoint.url(&["scholars", "ronin:a/b?c#d"]).unwrap();
        assert_eq!(url.path(), "/api/game/scholars/ronin:a%2Fb%3Fc%23d");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn hosts_share_throttles() {
        let registry = ThrottleRegistry::new();
        let settings = Settings {
            scholar_api: Some(UpstreamSettings {
                base_url: "https://tracker.example/api/game".to_string(),
                requests_per_second: std::num::NonZeroU32::new(100).unwrap(),
            }),
            adventure_api: UpstreamSettings {
                base_url: "https://game-api.example/game-api".to_string(),
                requests_per_second: std::num::NonZeroU32::new(50).unwrap(),
            },
            timeout: Duration::from_secs(5),
            cache_ttl: Duration::from_secs(60),
            cache_capacity: 10,
            cache_schema_version: "v1".to_string(),
        };
        HttpSnapshotClient::new(&settings, &registry).unwrap();
        HttpSnapshotClient::new(&settings, &registry).unwrap();
        assert_eq!(registry.len(), 2);
    }
}
