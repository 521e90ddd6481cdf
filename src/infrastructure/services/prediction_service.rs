//! Prediction service - validates a request, fetches a reading and runs the cascade

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::forecast::parse_forecast_date;
use crate::domain::provider::DataProvider;
use crate::domain::{District, DomainError, ForecastEngine, ForecastResult, StoreHandle};
use crate::infrastructure::observability::record_forecast;

/// Model store as seen by the serving process
#[derive(Debug, Clone)]
pub enum StoreState {
    Ready(Arc<StoreHandle>),
    NotTrained(String),
}

impl StoreState {
    pub fn from_load(result: Result<StoreHandle, DomainError>) -> Self {
        match result {
            Ok(handle) => Self::Ready(Arc::new(handle)),
            Err(e) => {
                warn!(error = %e, "Serving without a trained model store");
                Self::NotTrained(e.to_string())
            }
        }
    }
}

/// Snapshot for readiness probes
#[derive(Debug, Clone, Serialize)]
pub struct Readiness {
    pub store_ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_message: Option<String>,
    pub districts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<&'static str>,
}

pub struct PredictionService {
    store: StoreState,
    provider: Option<Arc<dyn DataProvider>>,
    engine: ForecastEngine,
}

impl PredictionService {
    pub fn new(store: StoreState, provider: Option<Arc<dyn DataProvider>>) -> Self {
        Self {
            store,
            provider,
            engine: ForecastEngine::new(),
        }
    }

    /// Forecast one district and date. Checks run in a fixed order so the
    /// cheapest failure is reported before any external call is made.
    pub async fn predict(
        &self,
        district: Option<&str>,
        date: Option<&str>,
    ) -> Result<ForecastResult, DomainError> {
        let started = Instant::now();
        let result = self.predict_inner(district, date).await;

        record_forecast(outcome_label(&result), started.elapsed());
        result
    }

    async fn predict_inner(
        &self,
        district: Option<&str>,
        date: Option<&str>,
    ) -> Result<ForecastResult, DomainError> {
        let store = match &self.store {
            StoreState::Ready(store) => store,
            StoreState::NotTrained(reason) => return Err(DomainError::not_trained(reason.clone())),
        };

        let provider = self.provider.as_ref().ok_or_else(|| {
            DomainError::enrichment_not_configured("no provider API key configured")
        })?;

        let (name, date) = match (present(district), present(date)) {
            (Some(name), Some(date)) => (name, date),
            _ => return Err(DomainError::validation("Missing district or date")),
        };

        let district = District::new(name).map_err(|_| DomainError::district_unknown(name))?;
        store.models_for(&district)?;

        let target = parse_forecast_date(date)?;

        let reading = provider
            .fetch(&district, target)
            .await
            .ok_or_else(|| DomainError::enrichment_unavailable(district.as_str(), target))?;

        let result = self.engine.forecast(store, district.as_str(), date, &reading)?;

        info!(
            district = %result.district(),
            date = %result.date(),
            load = result.load(),
            price = result.price(),
            blackout_chance = result.blackout_chance(),
            "Forecast produced"
        );

        Ok(result)
    }

    pub fn readiness(&self) -> Readiness {
        let (store_ready, store_message, districts) = match &self.store {
            StoreState::Ready(store) => (
                true,
                None,
                store.districts().iter().map(|d| d.to_string()).collect(),
            ),
            StoreState::NotTrained(reason) => (false, Some(reason.clone()), Vec::new()),
        };

        Readiness {
            store_ready,
            store_message,
            districts,
            provider: self.provider.as_ref().map(|p| p.name()),
        }
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn outcome_label(result: &Result<ForecastResult, DomainError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(DomainError::StoreNotTrained { .. }) => "not_trained",
        Err(DomainError::EnrichmentNotConfigured { .. }) => "provider_missing",
        Err(DomainError::EnrichmentUnavailable { .. }) => "no_reading",
        Err(DomainError::Prediction { .. }) => "prediction_failed",
        Err(DomainError::InputValidation { .. })
        | Err(DomainError::InvalidDate { .. })
        | Err(DomainError::DistrictUnknown { .. })
        | Err(DomainError::MissingCapacity { .. }) => "invalid_request",
        Err(_) => "error",
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use mockall::predicate::always;

    use super::*;
    use crate::domain::forecast::ExternalReading;
    use crate::domain::provider::mock::StaticDataProvider;
    use crate::domain::provider::MockDataProvider;
    use crate::domain::store::mock::store_with;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 15).unwrap()
    }

    fn ready() -> StoreState {
        StoreState::Ready(Arc::new(store_with(&[("Kolkata", 2000.0), ("Mumbai", 5000.0)])))
    }

    fn provider() -> Arc<StaticDataProvider> {
        Arc::new(StaticDataProvider::new().with_reading("Kolkata", date(), ExternalReading::new(8.0)))
    }

    #[tokio::test]
    async fn test_predict_success() {
        let service = PredictionService::new(ready(), Some(provider()));

        let result = service.predict(Some("Kolkata"), Some("2025-04-15")).await.unwrap();

        assert_eq!(result.district().as_str(), "Kolkata");
        assert_eq!(result.load(), 1800.0);
        assert_eq!(result.price(), 8.0);
        assert_eq!(result.blackout_chance(), 12.0);
    }

    #[tokio::test]
    async fn test_not_trained_wins_over_everything() {
        let service = PredictionService::new(StoreState::NotTrained("missing".into()), None);

        let err = service.predict(None, None).await.unwrap_err();
        assert!(matches!(err, DomainError::StoreNotTrained { .. }));
    }

    #[tokio::test]
    async fn test_missing_provider() {
        let service = PredictionService::new(ready(), None);

        let err = service.predict(Some("Kolkata"), Some("2025-04-15")).await.unwrap_err();
        assert!(matches!(err, DomainError::EnrichmentNotConfigured { .. }));
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let service = PredictionService::new(ready(), Some(provider()));

        for (district, date) in [(None, Some("2025-04-15")), (Some("Kolkata"), None), (Some("  "), Some("2025-04-15"))] {
            let err = service.predict(district, date).await.unwrap_err();
            assert!(matches!(err, DomainError::InputValidation { .. }));
        }
    }

    #[tokio::test]
    async fn test_unknown_district_skips_provider() {
        let mut mock = MockDataProvider::new();
        mock.expect_fetch().never();
        mock.expect_name().return_const("mock");
        let service = PredictionService::new(ready(), Some(Arc::new(mock)));

        let err = service.predict(Some("Atlantis"), Some("2025-04-15")).await.unwrap_err();
        assert!(matches!(err, DomainError::DistrictUnknown { .. }));
    }

    #[tokio::test]
    async fn test_invalid_date_skips_provider() {
        let mut mock = MockDataProvider::new();
        mock.expect_fetch().never();
        let service = PredictionService::new(ready(), Some(Arc::new(mock)));

        let err = service.predict(Some("Kolkata"), Some("someday")).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidDate { .. }));
    }

    #[tokio::test]
    async fn test_no_reading() {
        let mut mock = MockDataProvider::new();
        mock.expect_fetch().with(always(), always()).times(1).returning(|_, _| None);
        let service = PredictionService::new(ready(), Some(Arc::new(mock)));

        let err = service.predict(Some("Mumbai"), Some("2025-04-15")).await.unwrap_err();
        assert!(matches!(err, DomainError::EnrichmentUnavailable { .. }));
    }

    #[test]
    fn test_readiness() {
        let service = PredictionService::new(ready(), Some(provider()));
        let readiness = service.readiness();
        assert!(readiness.store_ready);
        assert_eq!(readiness.districts, vec!["Kolkata", "Mumbai"]);
        assert_eq!(readiness.provider, Some("static"));

        let service = PredictionService::new(StoreState::NotTrained("no files".into()), None);
        let readiness = service.readiness();
        assert!(!readiness.store_ready);
        assert_eq!(readiness.store_message.as_deref(), Some("no files"));
        assert!(readiness.provider.is_none());
    }
}
