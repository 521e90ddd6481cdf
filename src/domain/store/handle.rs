use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::domain::forecast::StageKind;
use crate::domain::regression::RegressionModel;
use crate::domain::{District, DomainError};

/// The load, price and blackout models of one district
#[derive(Debug, Clone)]
pub struct ModelTriple {
    load: Arc<dyn RegressionModel>,
    price: Arc<dyn RegressionModel>,
    blackout: Arc<dyn RegressionModel>,
}

impl ModelTriple {
    pub fn new(
        load: Arc<dyn RegressionModel>,
        price: Arc<dyn RegressionModel>,
        blackout: Arc<dyn RegressionModel>,
    ) -> Self {
        Self {
            load,
            price,
            blackout,
        }
    }

    /// Model backing a cascade stage
    pub fn model(&self, stage: StageKind) -> &dyn RegressionModel {
        match stage {
            StageKind::Load => self.load.as_ref(),
            StageKind::Price => self.price.as_ref(),
            StageKind::Blackout => self.blackout.as_ref(),
        }
    }
}

/// Read-only view of a trained store, built once and shared by reference
#[derive(Debug, Clone, Default)]
pub struct StoreHandle {
    models: HashMap<District, ModelTriple>,
    capacity: HashMap<District, f64>,
}

impl StoreHandle {
    pub fn new(models: HashMap<District, ModelTriple>, capacity: HashMap<District, f64>) -> Self {
        Self { models, capacity }
    }

    pub fn models_for(&self, district: &District) -> Result<&ModelTriple, DomainError> {
        self.models
            .get(district)
            .ok_or_else(|| DomainError::district_unknown(district.as_str()))
    }

    pub fn capacity_for(&self, district: &District) -> Result<f64, DomainError> {
        self.capacity
            .get(district)
            .copied()
            .ok_or_else(|| DomainError::district_unknown(district.as_str()))
    }

    /// Districts with a trained model triple, sorted
    pub fn districts(&self) -> Vec<&District> {
        let mut districts: Vec<&District> = self.models.keys().collect();
        districts.sort();
        districts
    }

    /// Districts present in only one of the two mappings
    pub fn inconsistent_districts(&self) -> Vec<&District> {
        let models: BTreeSet<&District> = self.models.keys().collect();
        let capacity: BTreeSet<&District> = self.capacity.keys().collect();

        models.symmetric_difference(&capacity).copied().collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
