use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use super::record::{cascade_series, TrainedTriple, TrainingRecord};
use crate::domain::forecast::StageKind;
use crate::domain::provider::DataProvider;
use crate::domain::regression::{ModelError, RegressionFitter};
use crate::domain::store::{ModelTriple, StoreHandle};
use crate::domain::{District, DomainError};

/// Districts, capacities and date range of one training run
#[derive(Debug, Clone)]
pub struct TrainingPlan {
    pub districts: Vec<(District, f64)>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub workers: usize,
    pub fetch_concurrency: usize,
}

impl TrainingPlan {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.districts.is_empty() {
            return Err(DomainError::configuration("no districts configured for training"));
        }

        let mut seen = HashSet::new();
        for (district, capacity) in &self.districts {
            if !seen.insert(district) {
                return Err(DomainError::configuration(format!(
                    "district '{}' is configured twice",
                    district
                )));
            }

            if !capacity.is_finite() || *capacity <= 0.0 {
                return Err(DomainError::configuration(format!(
                    "installed capacity for '{}' must be positive, got {}",
                    district, capacity
                )));
            }
        }

        if self.start > self.end {
            return Err(DomainError::configuration(format!(
                "training start {} is after end {}",
                self.start, self.end
            )));
        }

        if self.workers == 0 || self.fetch_concurrency == 0 {
            return Err(DomainError::configuration(
                "workers and fetch_concurrency must be at least 1",
            ));
        }

        Ok(())
    }

    /// Every date of the inclusive range
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.start
            .iter_days()
            .take_while(|d| *d <= self.end)
            .collect()
    }
}

/// Trained models and capacities ready to be persisted
#[derive(Debug, Clone, Serialize)]
pub struct TrainedStore<M> {
    pub models: BTreeMap<District, TrainedTriple<M>>,
    pub capacity: BTreeMap<District, f64>,
}

impl<M> TrainedStore<M>
where
    M: crate::domain::regression::RegressionModel + 'static,
{
    /// Move the models behind shared pointers for serving
    pub fn into_handle(self) -> StoreHandle {
        let models: HashMap<District, ModelTriple> = self
            .models
            .into_iter()
            .map(|(district, triple)| {
                let triple = ModelTriple::new(
                    Arc::new(triple.load),
                    Arc::new(triple.price),
                    Arc::new(triple.blackout),
                );
                (district, triple)
            })
            .collect();

        StoreHandle::new(models, self.capacity.into_iter().collect())
    }
}

/// A district left out of the persisted store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedDistrict {
    pub district: District,
    pub reason: String,
}

/// Outcome of a successful run
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrainingReport {
    pub trained: Vec<District>,
    pub skipped: Vec<SkippedDistrict>,
    /// (district, date) pairs without a usable reading
    pub skipped_pairs: usize,
    pub records: usize,
}

impl TrainingReport {
    pub fn has_warnings(&self) -> bool {
        !self.skipped.is_empty() || self.skipped_pairs > 0
    }
}

/// Destination of a trained store
#[async_trait]
pub trait ArtifactSink<M>: Send + Sync
where
    M: Send + Sync,
{
    async fn persist(&self, trained: &TrainedStore<M>) -> Result<(), DomainError>;
}

/// Fetch, group, fit and persist
#[derive(Clone)]
pub struct TrainingPipeline<F: RegressionFitter> {
    provider: Arc<dyn DataProvider>,
    fitter: Arc<F>,
    plan: TrainingPlan,
}

impl<F> TrainingPipeline<F>
where
    F: RegressionFitter + 'static,
{
    pub fn new(provider: Arc<dyn DataProvider>, fitter: F, plan: TrainingPlan) -> Self {
        Self {
            provider,
            fitter: Arc::new(fitter),
            plan,
        }
    }

    pub fn plan(&self) -> &TrainingPlan {
        &self.plan
    }

    /// Run the whole pipeline. Nothing is persisted unless at least one
    /// district produced a complete model triple.
    pub async fn run(&self, sink: &dyn ArtifactSink<F::Model>) -> Result<TrainingReport, DomainError> {
        self.plan.validate()?;

        info!(
            districts = self.plan.districts.len(),
            start = %self.plan.start,
            end = %self.plan.end,
            provider = self.provider.name(),
            "Starting training run"
        );

        let (records, skipped_pairs) = self.collect_records().await;

        if records.is_empty() {
            return Err(DomainError::no_training_data(
                "the provider returned no usable records for any district",
            ));
        }

        let record_count = records.len();
        let mut grouped = group_by_district(records);

        let mut skipped = Vec::new();
        let mut jobs = Vec::new();

        for (district, capacity) in &self.plan.districts {
            match grouped.remove(district) {
                Some(records) => jobs.push((district.clone(), *capacity, records)),
                None => {
                    warn!(district = %district, "No training data for district, skipping");
                    skipped.push(SkippedDistrict {
                        district: district.clone(),
                        reason: "no training data".to_string(),
                    });
                }
            }
        }

        let (trained, fit_failures) = self.fit_all(jobs).await;
        skipped.extend(fit_failures);

        if trained.models.is_empty() {
            return Err(DomainError::no_training_data(
                "no district produced a complete model triple",
            ));
        }

        sink.persist(&trained).await?;

        let report = TrainingReport {
            trained: trained.models.keys().cloned().collect(),
            skipped,
            skipped_pairs,
            records: record_count,
        };

        info!(
            trained = report.trained.len(),
            skipped = report.skipped.len(),
            skipped_pairs = report.skipped_pairs,
            "Training run complete"
        );

        Ok(report)
    }

    /// One provider call per (district, date), date-major
    async fn collect_records(&self) -> (Vec<TrainingRecord>, usize) {
        let pairs: Vec<(District, NaiveDate)> = self
            .plan
            .dates()
            .into_iter()
            .flat_map(|date| {
                self.plan
                    .districts
                    .iter()
                    .map(move |(district, _)| (district.clone(), date))
            })
            .collect();

        let results: Vec<_> = stream::iter(pairs)
            .map(|(district, date)| {
                let provider = self.provider.clone();
                async move {
                    info!(district = %district, %date, "Fetching training reading");
                    let reading = provider.fetch(&district, date).await;
                    (district, date, reading)
                }
            })
            .buffered(self.plan.fetch_concurrency)
            .collect()
            .await;

        let mut records = Vec::new();
        let mut skipped_pairs = 0;

        for (district, date, reading) in results {
            let Some(reading) = reading else {
                warn!(district = %district, %date, "No reading returned, skipping");
                skipped_pairs += 1;
                continue;
            };

            match TrainingRecord::from_reading(district.clone(), date, reading) {
                Some(record) => records.push(record),
                None => {
                    warn!(district = %district, %date, "Reading has no observed load or blackout risk, skipping");
                    skipped_pairs += 1;
                }
            }
        }

        (records, skipped_pairs)
    }

    /// Fit districts on blocking threads, at most `workers` at a time
    async fn fit_all(
        &self,
        jobs: Vec<(District, f64, Vec<TrainingRecord>)>,
    ) -> (TrainedStore<F::Model>, Vec<SkippedDistrict>) {
        let outcomes: Vec<_> = stream::iter(jobs)
            .map(|(district, capacity, records)| {
                let fitter = self.fitter.clone();
                async move {
                    info!(district = %district, records = records.len(), "Training models");
                    let outcome =
                        tokio::task::spawn_blocking(move || fit_district(fitter.as_ref(), &records, capacity))
                            .await;
                    (district, capacity, outcome)
                }
            })
            .buffer_unordered(self.plan.workers)
            .collect()
            .await;

        let mut trained = TrainedStore {
            models: BTreeMap::new(),
            capacity: BTreeMap::new(),
        };
        let mut skipped = Vec::new();

        for (district, capacity, outcome) in outcomes {
            let reason = match outcome {
                Ok(Ok(triple)) => {
                    trained.models.insert(district.clone(), triple);
                    trained.capacity.insert(district, capacity);
                    continue;
                }
                Ok(Err((stage, error))) => format!("{} model failed to fit: {}", stage, error),
                Err(join_error) => format!("fit task failed: {}", join_error),
            };

            warn!(district = %district, reason = %reason, "Skipping district");
            skipped.push(SkippedDistrict { district, reason });
        }

        skipped.sort_by(|a, b| a.district.cmp(&b.district));
        (trained, skipped)
    }
}

fn group_by_district(records: Vec<TrainingRecord>) -> HashMap<District, Vec<TrainingRecord>> {
    let mut grouped: HashMap<District, Vec<TrainingRecord>> = HashMap::new();

    for record in records {
        grouped.entry(record.district.clone()).or_default().push(record);
    }

    grouped
}

fn fit_district<F: RegressionFitter>(
    fitter: &F,
    records: &[TrainingRecord],
    capacity: f64,
) -> Result<TrainedTriple<F::Model>, (StageKind, ModelError)> {
    let mut load = None;
    let mut price = None;
    let mut blackout = None;

    for (stage, series) in cascade_series(records, capacity) {
        let model = fitter.fit(&series).map_err(|e| (stage, e))?;
        match stage {
            StageKind::Load => load = Some(model),
            StageKind::Price => price = Some(model),
            StageKind::Blackout => blackout = Some(model),
        }
    }

    match (load, price, blackout) {
        (Some(load), Some(price), Some(blackout)) => Ok(TrainedTriple {
            load,
            price,
            blackout,
        }),
        (None, _, _) => Err((StageKind::Load, ModelError::NotFitted)),
        (_, None, _) => Err((StageKind::Price, ModelError::NotFitted)),
        (_, _, None) => Err((StageKind::Blackout, ModelError::NotFitted)),
    }
}
