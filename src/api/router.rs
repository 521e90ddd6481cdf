use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::health;
use super::middleware::{logging_middleware, metrics_middleware};
use super::predict;
use super::state::AppState;

/// Create a minimal router without state
/// Note: /ready and /predict are not available without state
pub fn create_router() -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/live", get(health::live_check))
        .layer(TraceLayer::new_for_http())
}

/// Create the full router with application state
pub fn create_router_with_state(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        // Forecast API
        .route("/predict", post(predict::predict))
        // Add state and middleware
        .with_state(state)
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::NaiveDate;
    use tower::ServiceExt;

    use super::*;
    use crate::domain::forecast::ExternalReading;
    use crate::domain::provider::mock::StaticDataProvider;
    use crate::domain::store::mock::store_with;
    use crate::infrastructure::services::{PredictionService, StoreState};

    fn trained_state(with_provider: bool) -> AppState {
        let store = StoreState::Ready(Arc::new(store_with(&[
            ("Kolkata", 2000.0),
            ("Mumbai", 5000.0),
        ])));
        let provider = StaticDataProvider::new().with_reading(
            "Kolkata",
            NaiveDate::from_ymd_opt(2025, 4, 15).unwrap(),
            ExternalReading::new(8.0).with_weather(31.0, 70.0, 12.0),
        );
        let provider: Option<Arc<dyn crate::domain::DataProvider>> = if with_provider {
            Some(Arc::new(provider))
        } else {
            None
        };

        AppState::new(Arc::new(PredictionService::new(store, provider)))
    }

    fn untrained_state() -> AppState {
        AppState::new(Arc::new(PredictionService::new(
            StoreState::NotTrained("models.json not found".into()),
            Some(Arc::new(StaticDataProvider::new())),
        )))
    }

    fn predict_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/predict")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (status, body) = send(
            create_router(),
            Request::builder().uri("/health").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_live_endpoint() {
        let (status, _) = send(
            create_router(),
            Request::builder().uri("/live").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_predict_kolkata() {
        let app = create_router_with_state(trained_state(true));

        let (status, body) = send(
            app,
            predict_request(r#"{"district": "Kolkata", "date": "2025-04-15"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["district"], "Kolkata");
        assert_eq!(body["date"], "2025-04-15");
        assert_eq!(body["load"], 1800.0);
        assert_eq!(body["price"], 8.0);
        assert_eq!(body["blackout_chance"], 12.0);
    }

    #[tokio::test]
    async fn test_predict_accepts_timestamp_date() {
        let app = create_router_with_state(trained_state(true));

        let (status, body) = send(
            app,
            predict_request(r#"{"district": "Kolkata", "date": "2025-04-15T09:30:00Z"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["date"], "2025-04-15");
    }

    #[tokio::test]
    async fn test_predict_unknown_district() {
        let app = create_router_with_state(trained_state(true));

        let (status, body) = send(
            app,
            predict_request(r#"{"district": "Atlantis", "date": "2025-04-15"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid district");
    }

    #[tokio::test]
    async fn test_predict_not_trained() {
        let app = create_router_with_state(untrained_state());

        let (status, body) = send(
            app,
            predict_request(r#"{"district": "Kolkata", "date": "2025-04-15"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body["error"],
            "Models not trained yet. Please run the training script."
        );
    }

    #[tokio::test]
    async fn test_predict_without_provider() {
        let app = create_router_with_state(trained_state(false));

        let (status, body) = send(
            app,
            predict_request(r#"{"district": "Kolkata", "date": "2025-04-15"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "Data agent not initialized. Check API key.");
    }

    #[tokio::test]
    async fn test_predict_missing_fields() {
        let app = create_router_with_state(trained_state(true));

        let (status, body) = send(app, predict_request(r#"{"district": "Kolkata"}"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing district or date");
    }

    #[tokio::test]
    async fn test_predict_invalid_date() {
        let app = create_router_with_state(trained_state(true));

        let (status, body) = send(
            app,
            predict_request(r#"{"district": "Kolkata", "date": "15/04/2025"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid date");
    }

    #[tokio::test]
    async fn test_predict_no_reading() {
        let app = create_router_with_state(trained_state(true));

        let (status, body) = send(
            app,
            predict_request(r#"{"district": "Mumbai", "date": "2025-04-15"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Could not retrieve data for the district.");
    }

    #[tokio::test]
    async fn test_predict_malformed_json() {
        let app = create_router_with_state(trained_state(true));

        let (status, body) = send(app, predict_request(r#"{"district": "#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid JSON request");
    }

    #[tokio::test]
    async fn test_ready_reports_degraded_store() {
        let app = create_router_with_state(untrained_state());

        let (status, body) = send(
            app,
            Request::builder().uri("/ready").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["checks"][0]["name"], "model_store");
        assert_eq!(body["checks"][0]["status"], "degraded");
    }

    #[tokio::test]
    async fn test_ready_reports_healthy() {
        let app = create_router_with_state(trained_state(true));

        let (status, body) = send(
            app,
            Request::builder().uri("/ready").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }
}
