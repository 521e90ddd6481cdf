//! Train command - builds and persists the model store

use std::time::Instant;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::Args;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::domain::{TrainingPipeline, TrendRegressionFitter};
use crate::infrastructure::artifact::ArtifactStore;
use crate::infrastructure::logging;
use crate::infrastructure::observability::record_training_run;

#[derive(Args, Debug, Clone, Default)]
pub struct TrainArgs {
    /// First day of history (YYYY-MM-DD); defaults to `lookback_days` before the end
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last day of history (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Restrict the run to these configured districts (repeatable)
    #[arg(long = "district")]
    pub districts: Vec<String>,
}

/// Run one training pass. Fatal errors surface as a non-zero exit status.
pub async fn run(args: TrainArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&(&config.logging).into());
    config.validate()?;

    let provider = crate::build_data_provider(&config.provider)?
        .context("training needs a data provider: set provider.api_key or GEMINI_API_KEY")?;

    let plan = config.training.plan(
        args.start,
        args.end,
        &args.districts,
        Utc::now().date_naive(),
    )?;

    let fitter = TrendRegressionFitter::new()
        .with_weekly_seasonality(config.training.weekly_seasonality)
        .with_yearly_seasonality(config.training.yearly_seasonality);

    let store = ArtifactStore::new(&config.store.dir);
    let pipeline = TrainingPipeline::new(provider, fitter, plan);

    let started = Instant::now();
    let report = pipeline.run(&store).await?;
    record_training_run(report.trained.len(), report.skipped.len(), started.elapsed());

    for skipped in &report.skipped {
        warn!(district = %skipped.district, reason = %skipped.reason, "District skipped");
    }

    info!(
        trained = report.trained.len(),
        skipped = report.skipped.len(),
        skipped_pairs = report.skipped_pairs,
        records = report.records,
        dir = %store.dir().display(),
        "Models trained and saved"
    );

    Ok(())
}
