use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Feature values for one date, keyed by regressor name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    date: NaiveDate,
    values: BTreeMap<String, f64>,
}

impl FeatureRow {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// One labelled row of a training series
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub features: FeatureRow,
    pub target: f64,
}

/// Labelled history for one (district, target) pair
#[derive(Debug, Clone, Default)]
pub struct TrainingSeries {
    regressors: Vec<String>,
    observations: Vec<Observation>,
}

impl TrainingSeries {
    pub fn new<I, S>(regressors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            regressors: regressors.into_iter().map(Into::into).collect(),
            observations: Vec::new(),
        }
    }

    pub fn push(&mut self, features: FeatureRow, target: f64) {
        self.observations.push(Observation { features, target });
    }

    pub fn regressors(&self) -> &[String] {
        &self.regressors
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_row_lookup() {
        let date = NaiveDate::from_ymd_opt(2025, 4, 15).unwrap();
        let row = FeatureRow::new(date).with("load", 1520.5).with("price", 8.0);

        assert_eq!(row.date(), date);
        assert_eq!(row.get("load"), Some(1520.5));
        assert!(row.contains("price"));
        assert_eq!(row.get("capacity"), None);
        assert_eq!(row.names().collect::<Vec<_>>(), vec!["load", "price"]);
    }

    #[test]
    fn test_series_push() {
        let date = NaiveDate::from_ymd_opt(2025, 4, 15).unwrap();
        let mut series = TrainingSeries::new(["load"]);
        assert!(series.is_empty());

        series.push(FeatureRow::new(date).with("load", 10.0), 5.0);

        assert_eq!(series.len(), 1);
        assert_eq!(series.regressors(), &["load".to_string()]);
        assert_eq!(series.observations()[0].target, 5.0);
    }
}
