//! Health check endpoints for Kubernetes probes

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::api::types::Json;

use super::state::AppState;

/// Detailed health response with component status
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
}

/// Health check status
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// Individual component health check
#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Simple health check - returns 200 if the service is running
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
    };

    (StatusCode::OK, Json(response))
}

/// Readiness check. A missing store or provider degrades the service but it
/// keeps answering, with 503 from `/predict`.
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let readiness = state.prediction_service.readiness();

    let store = if readiness.store_ready {
        HealthCheck {
            name: "model_store".to_string(),
            status: HealthStatus::Healthy,
            message: Some(format!("{} districts", readiness.districts.len())),
        }
    } else {
        HealthCheck {
            name: "model_store".to_string(),
            status: HealthStatus::Degraded,
            message: readiness.store_message.clone(),
        }
    };

    let provider = match readiness.provider {
        Some(name) => HealthCheck {
            name: "data_provider".to_string(),
            status: HealthStatus::Healthy,
            message: Some(name.to_string()),
        },
        None => HealthCheck {
            name: "data_provider".to_string(),
            status: HealthStatus::Degraded,
            message: Some("no API key configured".to_string()),
        },
    };

    let status = if store.status == HealthStatus::Healthy && provider.status == HealthStatus::Healthy {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(vec![store, provider]),
    };

    (StatusCode::OK, Json(response))
}

/// Liveness check - simple check to verify the service is running
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}
