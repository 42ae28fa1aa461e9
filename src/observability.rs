use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: availability fetches attempted (one per session open or
/// checkout re-validation).
pub const AVAILABILITY_FETCHES_TOTAL: &str = "mariee_availability_fetches_total";

/// Counter: availability fetches that failed.
pub const AVAILABILITY_FETCH_FAILURES_TOTAL: &str = "mariee_availability_fetch_failures_total";

/// Histogram: availability fetch + index build latency in seconds.
pub const AVAILABILITY_FETCH_DURATION_SECONDS: &str = "mariee_availability_fetch_duration_seconds";

/// Counter: sessions opened in the stale (fail-open) state.
pub const STALE_SESSIONS_TOTAL: &str = "mariee_stale_sessions_total";

/// Counter: orders accepted and written to the store.
pub const ORDERS_SUBMITTED_TOTAL: &str = "mariee_orders_submitted_total";

/// Counter: order submissions rejected at validation. Labels: reason.
pub const ORDERS_REJECTED_TOTAL: &str = "mariee_orders_rejected_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: dresses with at least one unavailable range in the most
/// recently built index.
pub const INDEX_DRESSES_BLOCKED: &str = "mariee_index_dresses_blocked";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}
