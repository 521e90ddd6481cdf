//! Forecast cascade - load, then price, then blackout risk

mod date;
mod engine;
mod reading;
mod result;
mod stage;

pub use date::parse_forecast_date;
pub use engine::ForecastEngine;
pub use reading::{ExternalReading, ExtractionField};
pub use result::{round2, ForecastResult};
pub use stage::{validate_cascade, Stage, StageKind, Variable, CASCADE, RAW_FEATURES};
