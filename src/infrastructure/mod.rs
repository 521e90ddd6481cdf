//! Infrastructure layer - External service implementations

pub mod artifact;
pub mod llm;
pub mod logging;
pub mod observability;
pub mod provider;
pub mod services;
