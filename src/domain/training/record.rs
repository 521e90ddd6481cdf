use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::forecast::{ExternalReading, Stage, StageKind, Variable, CASCADE};
use crate::domain::regression::{FeatureRow, TrainingSeries};
use crate::domain::District;

/// One historical row: a reading plus the observed outcomes
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRecord {
    pub district: District,
    pub date: NaiveDate,
    pub reading: ExternalReading,
    pub load: f64,
    pub price: f64,
    pub blackout_risk: f64,
}

impl TrainingRecord {
    /// Readings without observed load and blackout risk cannot label a row
    pub fn from_reading(district: District, date: NaiveDate, reading: ExternalReading) -> Option<Self> {
        let (load, blackout_risk) = reading.observed()?;

        Some(Self {
            district,
            date,
            price: reading.price,
            load,
            blackout_risk,
            reading,
        })
    }

    /// Historical value of a cascade variable. Training uses observed values
    /// where serving uses the upstream stage estimates.
    fn value(&self, variable: Variable, capacity: f64) -> f64 {
        match variable {
            Variable::PriceProxy => self.reading.price,
            Variable::InstalledCapacity => capacity,
            Variable::Load => self.load,
            Variable::Price => self.price,
            Variable::BlackoutRisk => self.blackout_risk,
        }
    }
}

/// Per-district model triple in its persisted form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedTriple<M> {
    pub load: M,
    pub price: M,
    pub blackout: M,
}

/// Labelled series for one stage: regressors are the stage inputs, the label
/// is the stage output
pub fn stage_series(stage: &Stage, records: &[TrainingRecord], capacity: f64) -> TrainingSeries {
    let mut series = TrainingSeries::new(stage.input_names());

    for record in records {
        let mut row = FeatureRow::new(record.date);
        for input in stage.inputs {
            row.insert(input.name(), record.value(*input, capacity));
        }
        series.push(row, record.value(stage.output, capacity));
    }

    series
}

/// Series for every cascade stage, in cascade order
pub fn cascade_series(records: &[TrainingRecord], capacity: f64) -> Vec<(StageKind, TrainingSeries)> {
    CASCADE
        .iter()
        .map(|stage| (stage.kind, stage_series(stage, records, capacity)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(day: u32, load: f64, price: f64, blackout: f64) -> TrainingRecord {
        let date = NaiveDate::from_ymd_opt(2025, 3, day).unwrap();
        let reading = ExternalReading::new(price).with_observed(load, blackout);
        TrainingRecord::from_reading(District::new("Kolkata").unwrap(), date, reading).unwrap()
    }

    #[test]
    fn test_reading_without_observations_is_rejected() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let district = District::new("Kolkata").unwrap();

        let reading = ExternalReading::new(8.0).with_weather(25.0, 60.0, 15.0);
        assert!(TrainingRecord::from_reading(district, date, reading).is_none());
    }

    #[test]
    fn test_price_label_comes_from_reading() {
        let r = record(1, 1800.0, 8.5, 10.0);
        assert_eq!(r.price, 8.5);
        assert_eq!(r.load, 1800.0);
        assert_eq!(r.blackout_risk, 10.0);
    }

    #[test]
    fn test_stage_series_use_stage_inputs() {
        let records = vec![record(1, 1800.0, 8.0, 10.0), record(2, 1850.0, 9.0, 11.0)];
        let series = cascade_series(&records, 2000.0);

        let (kind, load) = &series[0];
        assert_eq!(*kind, StageKind::Load);
        assert_eq!(load.regressors(), &["price_proxy", "installed_capacity"]);
        assert_eq!(load.observations()[1].target, 1850.0);
        assert_eq!(load.observations()[1].features.get("installed_capacity"), Some(2000.0));

        let (kind, price) = &series[1];
        assert_eq!(*kind, StageKind::Price);
        assert_eq!(price.regressors(), &["load"]);
        assert_eq!(price.observations()[0].features.get("load"), Some(1800.0));
        assert_eq!(price.observations()[0].target, 8.0);

        let (kind, blackout) = &series[2];
        assert_eq!(*kind, StageKind::Blackout);
        assert_eq!(blackout.regressors(), &["load", "installed_capacity"]);
        assert_eq!(blackout.observations()[1].target, 11.0);
    }
}
