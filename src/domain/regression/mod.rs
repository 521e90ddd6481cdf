//! Time-series regression capability
//!
//! The forecast cascade and the training pipeline only depend on the two traits
//! defined here. [`TrendRegression`] is the shipped backend.

mod features;
mod trend;

use std::fmt::Debug;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub use features::{FeatureRow, Observation, TrainingSeries};
pub use trend::{TrendRegression, TrendRegressionFitter};

/// Errors raised by regression backends
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Model has not been fitted")]
    NotFitted,

    #[error("Insufficient data: required {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Missing regressor: {0}")]
    MissingRegressor(String),

    #[error("Numerical error: {0}")]
    Numerical(String),
}

/// A trained model producing a point estimate for one target variable
pub trait RegressionModel: Send + Sync + Debug {
    /// Names of the extra regressors the model reads from a feature row
    fn regressors(&self) -> &[String];

    /// Predict the target for a single feature row
    fn predict(&self, features: &FeatureRow) -> Result<f64, ModelError>;

    /// Check that the model's parameters are internally consistent.
    /// Deserialized models are checked before they are served.
    fn validate(&self) -> Result<(), ModelError> {
        Ok(())
    }
}

/// Fits a [`RegressionModel`] from a labelled series
pub trait RegressionFitter: Send + Sync + Debug {
    type Model: RegressionModel + Serialize + DeserializeOwned + Clone + 'static;

    fn fit(&self, series: &TrainingSeries) -> Result<Self::Model, ModelError>;
}
