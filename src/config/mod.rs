//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, DistrictCapacity, LogFormat, LoggingConfig, ProviderConfig, ServerConfig,
    StoreConfig, TrainingConfig,
};
