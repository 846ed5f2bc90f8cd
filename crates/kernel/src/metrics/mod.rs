//! Prometheus metrics collection.
//!
//! Provides application metrics in Prometheus format.

use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use prometheus_client::encoding::{EncodeLabelSet, text::encode};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;

use crate::state::AppState;

/// HTTP request labels.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct HttpLabels {
    pub method: String,
    pub path: String,
    pub status: u16,
}

/// Which in-process cache a hit or miss belongs to.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct CacheLabels {
    pub cache: String,
}

/// Application metrics.
pub struct Metrics {
    registry: Registry,

    /// HTTP request counter by method/path/status.
    pub http_requests: Family<HttpLabels, Counter>,

    /// HTTP request duration histogram.
    pub http_duration_seconds: Family<HttpLabels, Histogram>,

    /// Failed login attempts, including locked-out ones.
    pub login_failures: Counter,

    pub cache_hits: Family<CacheLabels, Counter>,

    pub cache_misses: Family<CacheLabels, Counter>,

    pub file_uploads: Counter,

    pub file_upload_bytes: Counter,
}

impl Metrics {
    /// Create a new metrics registry.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let http_requests = Family::<HttpLabels, Counter>::default();
        registry.register(
            "http_requests",
            "Total HTTP requests",
            http_requests.clone(),
        );

        let http_duration_seconds = Family::<HttpLabels, Histogram>::new_with_constructor(|| {
            Histogram::new(exponential_buckets(0.001, 2.0, 12))
        });
        registry.register(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
            http_duration_seconds.clone(),
        );

        let login_failures = Counter::default();
        registry.register(
            "login_failures",
            "Failed login attempts",
            login_failures.clone(),
        );

        let cache_hits = Family::<CacheLabels, Counter>::default();
        registry.register("cache_hits", "Cache hit count", cache_hits.clone());

        let cache_misses = Family::<CacheLabels, Counter>::default();
        registry.register(
            "cache_misses",
            "Cache miss count",
            cache_misses.clone(),
        );

        let file_uploads = Counter::default();
        registry.register(
            "file_uploads",
            "Total file uploads",
            file_uploads.clone(),
        );

        let file_upload_bytes = Counter::default();
        registry.register(
            "file_upload_bytes",
            "Total bytes uploaded",
            file_upload_bytes.clone(),
        );

        Self {
            registry,
            http_requests,
            http_duration_seconds,
            login_failures,
            cache_hits,
            cache_misses,
            file_uploads,
            file_upload_bytes,
        }
    }

    /// Record an HTTP request. `path` should be the matched route when known.
    pub fn record_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let labels = HttpLabels {
            method: method.to_string(),
            path: normalize_path(path),
            status,
        };

        self.http_requests.get_or_create(&labels).inc();
        self.http_duration_seconds
            .get_or_create(&labels)
            .observe(duration_secs);
    }

    pub fn record_login_failure(&self) {
        self.login_failures.inc();
    }

    pub fn record_cache_hit(&self, cache: &str) {
        self.cache_hits
            .get_or_create(&CacheLabels {
                cache: cache.to_string(),
            })
            .inc();
    }

    pub fn record_cache_miss(&self, cache: &str) {
        self.cache_misses
            .get_or_create(&CacheLabels {
                cache: cache.to_string(),
            })
            .inc();
    }

    pub fn record_upload(&self, bytes: u64) {
        self.file_uploads.inc();
        self.file_upload_bytes.inc_by(bytes);
    }

    /// Encode metrics in Prometheus text format.
    ///
    /// # Panics
    ///
    /// Panics if Prometheus metric encoding to a `String` buffer fails.
    /// The `fmt::Write` impl for `String` is infallible.
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        #[allow(clippy::expect_used)]
        encode(&mut buffer, &self.registry).expect("encoding metrics");
        buffer
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish()
    }
}

/// Middleware recording count and latency of every request.
pub async fn track_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;

    state.metrics().record_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}

/// Normalize a path for metrics labels.
///
/// Replaces numeric segments with a placeholder to limit cardinality on
/// paths that did not match a route.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|s| {
            if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
                "{id}"
            } else {
                s
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
