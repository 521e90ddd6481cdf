//! Domain layer - forecasting core, training and provider contracts

pub mod district;
pub mod error;
pub mod forecast;
pub mod llm;
pub mod provider;
pub mod regression;
pub mod store;
pub mod training;

pub use district::District;
pub use error::DomainError;
pub use forecast::{ExternalReading, ForecastEngine, ForecastResult};
pub use llm::{LlmProvider, LlmRequest, LlmRequestBuilder, LlmResponse, Message, MessageRole};
pub use provider::{DataProvider, FieldExtractor, PageSource};
pub use regression::{RegressionFitter, RegressionModel, TrendRegression, TrendRegressionFitter};
pub use store::{ModelTriple, StoreHandle};
pub use training::{ArtifactSink, TrainedStore, TrainingPipeline, TrainingPlan, TrainingReport};
