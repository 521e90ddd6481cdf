//! Application state for shared services

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{DomainError, ForecastResult};
use crate::infrastructure::services::{PredictionService, Readiness};

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub prediction_service: Arc<dyn PredictionServiceTrait>,
}

impl AppState {
    pub fn new(prediction_service: Arc<dyn PredictionServiceTrait>) -> Self {
        Self { prediction_service }
    }
}

/// Trait for prediction service operations
#[async_trait]
pub trait PredictionServiceTrait: Send + Sync {
    async fn predict(
        &self,
        district: Option<&str>,
        date: Option<&str>,
    ) -> Result<ForecastResult, DomainError>;

    fn readiness(&self) -> Readiness;
}

#[async_trait]
impl PredictionServiceTrait for PredictionService {
    async fn predict(
        &self,
        district: Option<&str>,
        date: Option<&str>,
    ) -> Result<ForecastResult, DomainError> {
        PredictionService::predict(self, district, date).await
    }

    fn readiness(&self) -> Readiness {
        PredictionService::readiness(self)
    }
}
