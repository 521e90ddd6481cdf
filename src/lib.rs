//! gridcast
//!
//! District-level electricity forecasts from a three-stage model cascade:
//! - load from a price proxy and installed capacity
//! - price from the load estimate
//! - blackout chance from load and installed capacity
//!
//! Models are trained offline from scraped, LLM-extracted readings and
//! served over HTTP.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use api::state::AppState;
use config::ProviderConfig;
use domain::{DataProvider, TrendRegression};
use infrastructure::{
    artifact::ArtifactStore,
    llm::{GeminiProvider, HttpClient},
    provider::{HttpPageSource, LlmFieldExtractor, ScrapingDataProvider},
    services::{PredictionService, StoreState},
};

/// Wire the scraping provider, or `None` when no API key is configured
pub fn build_data_provider(
    config: &ProviderConfig,
) -> anyhow::Result<Option<Arc<dyn DataProvider>>> {
    let Some(api_key) = config.api_key.as_deref() else {
        warn!("No provider API key configured, predictions are disabled");
        return Ok(None);
    };

    let client = HttpClient::with_timeout(config.timeout())
        .context("failed to build HTTP client")?;

    let llm = match config.base_url.as_deref() {
        Some(base_url) => GeminiProvider::with_base_url(client.clone(), api_key, base_url),
        None => GeminiProvider::new(client.clone(), api_key),
    };

    let source = HttpPageSource::new(client, config.url_template.clone());
    let extractor = LlmFieldExtractor::new(Arc::new(llm), config.model.clone());

    info!(model = %config.model, "Data provider initialized");

    Ok(Some(Arc::new(ScrapingDataProvider::new(
        Arc::new(source),
        Arc::new(extractor),
        config.timeout(),
    ))))
}

/// Build application state. A missing store or provider is not fatal: the
/// server starts and `/predict` answers 503.
pub fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let store = StoreState::from_load(ArtifactStore::new(&config.store.dir).load::<TrendRegression>());
    let provider = build_data_provider(&config.provider)?;

    Ok(AppState::new(Arc::new(PredictionService::new(store, provider))))
}
