//! Error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::domain::DomainError;

pub const NOT_TRAINED: &str = "Models not trained yet. Please run the training script.";
pub const PROVIDER_NOT_CONFIGURED: &str = "Data agent not initialized. Check API key.";
pub const MISSING_FIELDS: &str = "Missing district or date";
pub const INVALID_DISTRICT: &str = "Invalid district";
pub const INVALID_DATE: &str = "Invalid date";
pub const MISSING_CAPACITY: &str = "Installed capacity not found for the district";
pub const NO_READING: &str = "Could not retrieve data for the district.";
pub const PREDICTION_FAILED: &str = "Prediction failed";

/// Error body: a short label plus an optional detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                error: error.into(),
                message: None,
            },
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.response.message = Some(message.into());
        self
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    pub fn internal(error: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }

    pub fn unavailable(error: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match &err {
            DomainError::InputValidation { message } => Self::bad_request(message),
            DomainError::InvalidDate { value } => Self::bad_request(INVALID_DATE)
                .with_message(format!("'{}' is not a calendar date", value)),
            DomainError::DistrictUnknown { .. } => Self::bad_request(INVALID_DISTRICT),
            DomainError::MissingCapacity { .. } => Self::bad_request(MISSING_CAPACITY),
            DomainError::StoreNotTrained { .. } => Self::unavailable(NOT_TRAINED),
            DomainError::EnrichmentNotConfigured { .. } => Self::unavailable(PROVIDER_NOT_CONFIGURED),
            DomainError::EnrichmentUnavailable { .. } => Self::internal(NO_READING),
            DomainError::Prediction { stage, .. } => {
                error!(error = %err, "Prediction failed");
                Self::internal(PREDICTION_FAILED)
                    .with_message(format!("The {} model could not produce an estimate", stage))
            }
            DomainError::Provider { provider, .. } => {
                error!(error = %err, "Provider error");
                Self::unavailable("Provider error").with_message(format!("{} is unavailable", provider))
            }
            DomainError::NoTrainingData { .. }
            | DomainError::Storage { .. }
            | DomainError::Configuration { .. } => {
                error!(error = %err, "Internal error");
                Self::internal("Internal server error")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.response.message {
            Some(message) => write!(f, "{} {}: {}", self.status, self.response.error, message),
            None => write!(f, "{} {}", self.status, self.response.error),
        }
    }
}

impl std::error::Error for ApiError {}
