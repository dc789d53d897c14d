use std::net::SocketAddr;
use tracing::{info, warn};

// Metric names emitted by the pipeline
pub const TARGETS_TOTAL: &str = "scout_targets_total";
pub const TARGET_FAILURES_TOTAL: &str = "scout_target_failures_total";
pub const CANDIDATES_TOTAL: &str = "scout_candidates_total";
pub const PARSE_SKIPPED_TOTAL: &str = "scout_parse_skipped_total";
pub const EVENTS_UPLOADED_TOTAL: &str = "scout_events_uploaded_total";
pub const EVENTS_DUPLICATE_TOTAL: &str = "scout_events_duplicate_total";
pub const UPLOAD_FAILURES_TOTAL: &str = "scout_upload_failures_total";
pub const GEOCODE_CACHE_HITS_TOTAL: &str = "scout_geocode_cache_hits_total";
pub const GEOCODE_REQUESTS_TOTAL: &str = "scout_geocode_requests_total";
pub const GEOCODE_FALLBACKS_TOTAL: &str = "scout_geocode_fallbacks_total";
pub const TARGET_DURATION_SECONDS: &str = "scout_target_duration_seconds";

/// Installs the Prometheus exporter when an address is configured.
/// Without it the `metrics` macros are no-ops.
pub fn init_metrics(addr: Option<&str>) {
    let Some(addr) = addr else {
        return;
    };
    let addr: SocketAddr = match addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics address '{}': {}", addr, e);
            return;
        }
    };
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => info!("Prometheus exporter listening on http://{}/metrics", addr),
        Err(e) => warn!("Prometheus exporter install failed (possibly already installed): {}", e),
    }
}
