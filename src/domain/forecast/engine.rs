use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::date::parse_forecast_date;
use super::{round2, ExternalReading, ForecastResult, Stage, Variable, CASCADE};
use crate::domain::regression::{FeatureRow, ModelError};
use crate::domain::store::StoreHandle;
use crate::domain::{District, DomainError};

/// Runs the stage cascade for one district, date and reading.
///
/// Stateless: the same store contents and inputs always produce the same
/// result. Predicted values feed forward, so errors compound across stages.
#[derive(Debug, Clone, Copy)]
pub struct ForecastEngine {
    stages: &'static [Stage],
}

impl Default for ForecastEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ForecastEngine {
    pub fn new() -> Self {
        Self { stages: &CASCADE }
    }

    pub fn stages(&self) -> &'static [Stage] {
        self.stages
    }

    pub fn forecast(
        &self,
        store: &StoreHandle,
        district: &str,
        date: &str,
        reading: &ExternalReading,
    ) -> Result<ForecastResult, DomainError> {
        let district = District::new(district)?;
        let triple = store.models_for(&district)?;
        let capacity = store
            .capacity_for(&district)
            .map_err(|_| DomainError::missing_capacity(district.as_str()))?;
        let date = parse_forecast_date(date)?;

        let mut known: BTreeMap<Variable, f64> = BTreeMap::new();
        known.insert(Variable::PriceProxy, reading.price);
        known.insert(Variable::InstalledCapacity, capacity);

        for stage in self.stages {
            let mut row = FeatureRow::new(date);

            for input in stage.inputs {
                let value = known.get(input).copied().ok_or_else(|| {
                    DomainError::configuration(format!(
                        "stage '{}' consumes '{}' before it is produced",
                        stage.kind, input
                    ))
                })?;
                row.insert(input.name(), value);
            }

            let estimate = triple.model(stage.kind).predict(&row).map_err(|source| {
                warn!(
                    district = %district,
                    %date,
                    stage = %stage.kind,
                    error = %source,
                    "Stage prediction failed"
                );
                DomainError::prediction(stage.kind.name(), source)
            })?;

            if !round2(estimate).is_finite() {
                warn!(
                    district = %district,
                    %date,
                    stage = %stage.kind,
                    estimate,
                    "Estimate out of range"
                );
                return Err(DomainError::prediction(
                    stage.kind.name(),
                    ModelError::Numerical(format!("estimate {} is out of range", estimate)),
                ));
            }

            debug!(district = %district, stage = %stage.kind, estimate, "Stage predicted");
            known.insert(stage.output, estimate);
        }

        let output = |variable: Variable| {
            known.get(&variable).copied().ok_or_else(|| {
                DomainError::configuration(format!("cascade does not produce '{}'", variable))
            })
        };

        Ok(ForecastResult::new(
            district,
            date,
            output(Variable::Load)?,
            output(Variable::Price)?,
            output(Variable::BlackoutRisk)?,
        ))
    }
}
