//! Upstream API client with a short-lived per-stop cache.
//!
//! ```text
//! fetch_departures(stop, limit)
//!        │
//!        ├── cached & age < TTL ──▶ first `limit` entries, no request
//!        │
//!        └── GET <base>?rbl=<stop> ──▶ parse ──▶ flatten + sort
//!                                                   │
//!                                cache full list ◀──┘──▶ first `limit` entries
//! ```
//!
//! The cache is shared by every widget using the client. Evicting a stop
//! affects every widget watching it.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use url::Url;

use crate::config::UpstreamConfig;
use crate::departure::{Departure, StopSnapshot};
use crate::error::{ConfigError, UpstreamError};
use crate::messages::MonitorResponse;
use crate::traits::{Clock, Transport};

/// Snapshot of what the cache currently holds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of cached stops.
    pub size: usize,
    /// Cached stop ids, ascending.
    pub entries: Vec<i64>,
}

/// Client for the real-time monitor endpoint.
///
/// Generic over the [`Transport`] and the [`Clock`] used for the cache TTL.
///
/// # Example
///
/// ```rust
/// use rs_departures::hal::{MockClock, MockTransport};
/// use rs_departures::{UpstreamClient, UpstreamConfig};
///
/// let client = UpstreamClient::new(
///     MockTransport::new(),
///     MockClock::new(),
///     &UpstreamConfig::default(),
/// )
/// .unwrap();
/// assert_eq!(
///     client.monitor_url(4111),
///     "https://www.wienerlinien.at/ogd_realtime/monitor?rbl=4111"
/// );
/// ```
pub struct UpstreamClient<T, C> {
    transport: T,
    clock: C,
    base_url: Url,
    cache_ttl_ms: u64,
    cache: Mutex<HashMap<i64, StopSnapshot>>,
}

impl<T: Transport, C: Clock> UpstreamClient<T, C> {
    /// Creates a client. Fails if the configured base URL doesn't parse.
    pub fn new(transport: T, clock: C, config: &UpstreamConfig) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            transport,
            clock,
            base_url,
            cache_ttl_ms: config.cache_ttl_ms,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// The request URL for a stop.
    pub fn monitor_url(&self, stop_id: i64) -> String {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().append_pair("rbl", &stop_id.to_string());
        url.into()
    }

    /// Clock used for cache ages.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Cache time-to-live in milliseconds.
    pub fn cache_ttl_ms(&self) -> u64 {
        self.cache_ttl_ms
    }

    /// Up to `limit` departures for a stop, soonest first.
    ///
    /// Served from cache while the stop's snapshot is younger than the TTL.
    /// Otherwise issues exactly one request, caches the full sorted list and
    /// returns its head. Nothing is retried.
    pub async fn fetch_departures(
        &self,
        stop_id: i64,
        limit: usize,
    ) -> Result<Vec<Departure>, UpstreamError> {
        if let Some(departures) = self.cached(stop_id, limit) {
            debug!(stop = stop_id, count = departures.len(), "cache hit");
            return Ok(departures);
        }

        match self.fetch_uncached(stop_id).await {
            Ok(snapshot) => {
                let departures = snapshot.take(limit);
                self.lock().insert(stop_id, snapshot);
                Ok(departures)
            }
            Err(e) => {
                error!(stop = stop_id, error = %e, "failed to fetch departures");
                Err(e)
            }
        }
    }

    /// The single soonest departure, if any.
    pub async fn next_departure(&self, stop_id: i64) -> Result<Option<Departure>, UpstreamError> {
        Ok(self.fetch_departures(stop_id, 1).await?.into_iter().next())
    }

    /// Evicts one stop, or everything with `None`.
    pub fn clear_cache(&self, stop_id: Option<i64>) {
        let mut cache = self.lock();
        match stop_id {
            Some(id) => {
                cache.remove(&id);
                debug!(stop = id, "cache entry cleared");
            }
            None => {
                cache.clear();
                debug!("cache cleared");
            }
        }
    }

    /// Cached stop ids.
    pub fn cache_stats(&self) -> CacheStats {
        let mut entries: Vec<i64> = self.lock().keys().copied().collect();
        entries.sort_unstable();
        CacheStats {
            size: entries.len(),
            entries,
        }
    }

    fn cached(&self, stop_id: i64, limit: usize) -> Option<Vec<Departure>> {
        let now = self.clock.now_ms();
        self.lock()
            .get(&stop_id)
            .filter(|snapshot| snapshot.is_fresh(now, self.cache_ttl_ms))
            .map(|snapshot| snapshot.take(limit))
    }

    async fn fetch_uncached(&self, stop_id: i64) -> Result<StopSnapshot, UpstreamError> {
        let url = self.monitor_url(stop_id);
        info!(stop = stop_id, %url, "fetching departures");

        let response = self.transport.get_json(&url).await?;
        debug!(stop = stop_id, status = response.status, "response received");

        if !response.is_success() {
            error!(
                stop = stop_id,
                status = response.status,
                body = response.body_str().unwrap_or("<binary>"),
                "API error response"
            );
            return Err(UpstreamError::Status {
                status: response.status,
                reason: response.reason,
            });
        }

        let parsed: MonitorResponse = match serde_json::from_slice(&response.body) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!(
                    stop = stop_id,
                    body = truncate(response.body_str().unwrap_or("<binary>"), LOGGED_BODY_CHARS),
                    "unparseable response"
                );
                return Err(e.into());
            }
        };
        if parsed.monitors().is_empty() {
            return Err(UpstreamError::NoMonitors { stop_id });
        }

        let departures = parsed.flatten();
        info!(
            stop = stop_id,
            title = parsed.monitors()[0].stop_title().unwrap_or("?"),
            count = departures.len(),
            "departures fetched"
        );

        Ok(StopSnapshot {
            stop_id,
            departures,
            fetched_at_ms: self.clock.now_ms(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<i64, StopSnapshot>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Longest response excerpt written to the log.
const LOGGED_BODY_CHARS: usize = 500;

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockClock, MockTransport};
    use crate::traits::HttpResponse;

    const ONE_LINE: &str = r#"{"data":{"monitors":[{"lines":[{
        "name":"U1","towards":"LEOPOLDAU","platform":"2","barrierFree":true,"type":"ptMetro",
        "departures":{"departure":[
            {"departureTime":{"countdown":4}},
            {"departureTime":{"countdown":1}},
            {"departureTime":{"countdown":9}}
        ]}}]}]}}"#;

    fn client() -> (UpstreamClient<MockTransport, MockClock>, MockTransport, MockClock) {
        let transport = MockTransport::new();
        let clock = MockClock::new();
        let client =
            UpstreamClient::new(transport.clone(), clock.clone(), &UpstreamConfig::default())
                .unwrap();
        (client, transport, clock)
    }

    #[test]
    fn rejects_bad_base_url() {
        let config = UpstreamConfig::default().with_base_url("not a url");
        let result = UpstreamClient::new(MockTransport::new(), MockClock::new(), &config);
        assert!(matches!(result, Err(ConfigError::InvalidBaseUrl { .. })));
    }

    #[tokio::test]
    async fn tags_and_sorts() {
        let (client, transport, _) = client();
        transport.respond_json(ONE_LINE);

        let deps = client.fetch_departures(4111, 10).await.unwrap();
        let countdowns: Vec<i64> = deps.iter().map(|d| d.countdown).collect();
        assert_eq!(countdowns, vec![1, 4, 9]);
        assert_eq!(deps[0].platform, "2");
        assert!(deps[0].barrier_free);
        assert_eq!(deps[0].vehicle_type, "ptMetro");
        assert_eq!(
            transport.requests(),
            vec!["https://www.wienerlinien.at/ogd_realtime/monitor?rbl=4111"]
        );
    }

    #[tokio::test]
    async fn cache_keeps_full_list() {
        let (client, transport, _) = client();
        transport.respond_json(ONE_LINE);

        assert_eq!(client.fetch_departures(4111, 1).await.unwrap().len(), 1);
        assert_eq!(client.fetch_departures(4111, 10).await.unwrap().len(), 3);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn ttl_boundary_refetches() {
        let (client, transport, clock) = client();
        transport.respond_json(ONE_LINE);

        client.fetch_departures(4111, 10).await.unwrap();
        clock.advance(29_999);
        client.fetch_departures(4111, 10).await.unwrap();
        assert_eq!(transport.request_count(), 1);

        clock.advance(1);
        client.fetch_departures(4111, 10).await.unwrap();
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let (client, transport, _) = client();
        transport.queue(Ok(HttpResponse::with_status(503, "Service Unavailable", "")));
        transport.respond_json(ONE_LINE);

        let err = client.fetch_departures(4111, 10).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Status { status: 503, .. }));
        assert_eq!(client.cache_stats().size, 0);

        assert!(client.fetch_departures(4111, 10).await.is_ok());
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn next_departure_is_soonest() {
        let (client, transport, _) = client();
        transport.respond_json(ONE_LINE);

        let next = client.next_departure(4111).await.unwrap().unwrap();
        assert_eq!(next.countdown, 1);
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn failure_is_logged() {
        let (client, transport, _) = client();
        transport.respond(Err(crate::TransportError::new("connection refused")));

        assert!(client.fetch_departures(4111, 10).await.is_err());
        assert!(logs_contain("failed to fetch departures"));
        assert!(logs_contain("connection refused"));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn error_body_is_logged() {
        let (client, transport, _) = client();
        transport.queue(Ok(HttpResponse::with_status(
            400,
            "Bad Request",
            "rbl parameter missing",
        )));
        transport.respond_json(&format!("<html>{}</html>", "x".repeat(2_000)));

        assert!(client.fetch_departures(4111, 10).await.is_err());
        assert!(logs_contain("rbl parameter missing"));

        assert!(client.fetch_departures(4111, 10).await.is_err());
        assert!(logs_contain("unparseable response"));
        assert!(!logs_contain(&"x".repeat(600)));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn stop_title_is_logged() {
        let (client, transport, _) = client();
        transport.respond_json(
            r#"{"data":{"monitors":[{"locationStop":{"properties":{"title":"Stephansplatz"}},"lines":[]}]}}"#,
        );

        client.fetch_departures(4111, 10).await.unwrap();
        assert!(logs_contain("Stephansplatz"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("hütteldorf", 2), "hü");
        assert_eq!(truncate("abc", 10), "abc");
    }

    #[tokio::test]
    async fn stats_are_sorted() {
        let (client, transport, _) = client();
        transport.respond_json(ONE_LINE);

        client.fetch_departures(300, 1).await.unwrap();
        client.fetch_departures(7, 1).await.unwrap();
        assert_eq!(
            client.cache_stats(),
            CacheStats {
                size: 2,
                entries: vec![7, 300],
            }
        );

        client.clear_cache(Some(300));
        assert_eq!(client.cache_stats().entries, vec![7]);
        client.clear_cache(None);
        assert_eq!(client.cache_stats().size, 0);
    }
}
