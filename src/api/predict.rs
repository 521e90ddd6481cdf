//! Forecast endpoint

use axum::extract::State;

use super::state::AppState;
use super::types::{ApiError, Json, PredictRequest, PredictResponse};

/// POST /predict - Forecast load, price and blackout chance for a district and date
pub async fn predict(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    let result = state
        .prediction_service
        .predict(request.district.as_deref(), request.date.as_deref())
        .await?;

    Ok(Json(result.into()))
}
