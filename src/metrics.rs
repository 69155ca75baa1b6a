// src/metrics.rs
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub const REQUESTS_TOTAL: &str = "analytics_requests_total";
pub const TEXTS_SCORED_TOTAL: &str = "analytics_texts_scored_total";
pub const ERRORS_TOTAL: &str = "analytics_errors_total";
pub const REQUEST_DURATION_MS: &str = "analytics_request_duration_ms";

// The global recorder can only be installed once per process.
static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder (first call) and describe the series.
    pub fn init() -> anyhow::Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| {
                let handle = PrometheusBuilder::new()
                    .install_recorder()
                    .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;
                describe_counter!(REQUESTS_TOTAL, "Requests handled, by endpoint.");
                describe_counter!(TEXTS_SCORED_TOTAL, "Texts scored for sentiment.");
                describe_counter!(ERRORS_TOTAL, "Failed requests, by error kind.");
                describe_histogram!(
                    REQUEST_DURATION_MS,
                    "Request handling time in milliseconds, by endpoint."
                );
                Ok::<_, anyhow::Error>(handle)
            })?
            .clone();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
