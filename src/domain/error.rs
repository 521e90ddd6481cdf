use thiserror::Error;

use crate::domain::regression::ModelError;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    InputValidation { message: String },

    #[error("Invalid date: '{value}'")]
    InvalidDate { value: String },

    #[error("Unknown district: '{district}'")]
    DistrictUnknown { district: String },

    #[error("Installed capacity not found for district '{district}'")]
    MissingCapacity { district: String },

    #[error("Store not trained: {message}")]
    StoreNotTrained { message: String },

    #[error("Enrichment not configured: {message}")]
    EnrichmentNotConfigured { message: String },

    #[error("No reading available for '{district}' on {date}")]
    EnrichmentUnavailable { district: String, date: String },

    #[error("Prediction failed at stage '{stage}': {source}")]
    Prediction {
        stage: &'static str,
        #[source]
        source: ModelError,
    },

    #[error("No training data: {message}")]
    NoTrainingData { message: String },

    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::InputValidation {
            message: message.into(),
        }
    }

    pub fn invalid_date(value: impl Into<String>) -> Self {
        Self::InvalidDate {
            value: value.into(),
        }
    }

    pub fn district_unknown(district: impl Into<String>) -> Self {
        Self::DistrictUnknown {
            district: district.into(),
        }
    }

    pub fn missing_capacity(district: impl Into<String>) -> Self {
        Self::MissingCapacity {
            district: district.into(),
        }
    }

    pub fn not_trained(message: impl Into<String>) -> Self {
        Self::StoreNotTrained {
            message: message.into(),
        }
    }

    pub fn enrichment_not_configured(message: impl Into<String>) -> Self {
        Self::EnrichmentNotConfigured {
            message: message.into(),
        }
    }

    pub fn enrichment_unavailable(district: impl Into<String>, date: impl ToString) -> Self {
        Self::EnrichmentUnavailable {
            district: district.into(),
            date: date.to_string(),
        }
    }

    pub fn prediction(stage: &'static str, source: ModelError) -> Self {
        Self::Prediction { stage, source }
    }

    pub fn no_training_data(message: impl Into<String>) -> Self {
        Self::NoTrainingData {
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
