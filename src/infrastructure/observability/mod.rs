//! Observability infrastructure - Prometheus metrics

mod config;
mod metrics;

pub use config::{MetricsConfig, ObservabilityConfig};
pub use metrics::{
    create_metrics_router, init_metrics, record_forecast, record_http_request,
    record_provider_fetch, record_training_run, FetchOutcome, PrometheusMetrics,
};
