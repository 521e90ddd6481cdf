//! Prometheus metrics infrastructure

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use super::config::MetricsConfig;

/// Prometheus metrics handle for serving metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    /// Get the metrics as a string for the /metrics endpoint
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Initialize Prometheus metrics
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            gauge!("gridcast_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);

            tracing::info!("Prometheus metrics initialized at {}", config.path);

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

/// Create the metrics router
pub fn create_metrics_router(metrics: PrometheusMetrics, path: &str) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

/// Record an HTTP request metric. `route` must be a matched route template.
pub fn record_http_request(method: &str, route: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("route", truncate(route)),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    if status >= 500 {
        counter!("http_server_errors_total", &labels).increment(1);
    }
}

/// Result of one provider fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Success,
    NoPage,
    NoFields,
    Timeout,
}

impl FetchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NoPage => "no_page",
            Self::NoFields => "no_fields",
            Self::Timeout => "timeout",
        }
    }
}

/// Record a provider fetch and its latency
pub fn record_provider_fetch(provider: &str, outcome: FetchOutcome, duration: Duration) {
    let labels = [
        ("provider", provider.to_string()),
        ("outcome", outcome.as_str().to_string()),
    ];

    counter!("provider_fetches_total", &labels).increment(1);
    histogram!("provider_fetch_duration_seconds", &labels).record(duration.as_secs_f64());
}

/// Record a forecast request by its terminal status
pub fn record_forecast(status: &'static str, duration: Duration) {
    counter!("forecasts_total", "status" => status).increment(1);
    histogram!("forecast_duration_seconds", "status" => status).record(duration.as_secs_f64());
}

/// Record the outcome of a training run
pub fn record_training_run(trained: usize, skipped: usize, duration: Duration) {
    gauge!("training_trained_districts").set(trained as f64);
    gauge!("training_skipped_districts").set(skipped as f64);
    histogram!("training_run_duration_seconds").record(duration.as_secs_f64());
}

fn truncate(route: &str) -> String {
    route.chars().take(50).collect()
}
