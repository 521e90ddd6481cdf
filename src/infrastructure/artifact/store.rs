use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::regression::RegressionModel;
use crate::domain::store::StoreHandle;
use crate::domain::training::{ArtifactSink, TrainedStore, TrainedTriple};
use crate::domain::{District, DomainError};

pub const MODELS_FILE: &str = "models.json";
pub const CAPACITY_FILE: &str = "installed_capacity.json";

#[derive(Serialize)]
struct ModelsFileOut<'a, M> {
    generation: Uuid,
    trained_at: DateTime<Utc>,
    models: &'a BTreeMap<District, TrainedTriple<M>>,
}

#[derive(Deserialize)]
struct ModelsFileIn<M> {
    generation: Uuid,
    trained_at: DateTime<Utc>,
    models: BTreeMap<District, TrainedTriple<M>>,
}

#[derive(Serialize, Deserialize)]
struct CapacityFile {
    generation: Uuid,
    capacity: BTreeMap<District, f64>,
}

/// Model triples and installed capacity persisted as a pair of JSON files
/// sharing one generation id
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn models_path(&self) -> PathBuf {
        self.dir.join(MODELS_FILE)
    }

    pub fn capacity_path(&self) -> PathBuf {
        self.dir.join(CAPACITY_FILE)
    }

    /// Read the persisted pair. Absent, unreadable or mismatched files all
    /// mean the store is not trained.
    pub fn load<M>(&self) -> Result<StoreHandle, DomainError>
    where
        M: RegressionModel + DeserializeOwned + 'static,
    {
        let models: ModelsFileIn<M> = read_json(&self.models_path())?;
        let capacity: CapacityFile = read_json(&self.capacity_path())?;

        if models.generation != capacity.generation {
            return Err(DomainError::not_trained(format!(
                "artifact generations differ ({} vs {}), the last write did not complete",
                models.generation, capacity.generation
            )));
        }

        for (district, triple) in &models.models {
            let stages = [("load", &triple.load), ("price", &triple.price), ("blackout", &triple.blackout)];
            for (stage, model) in stages {
                model.validate().map_err(|e| {
                    DomainError::not_trained(format!(
                        "{} model for {} is malformed: {}",
                        stage, district, e
                    ))
                })?;
            }
        }

        let handle = TrainedStore {
            models: models.models,
            capacity: capacity.capacity,
        }
        .into_handle();

        for district in handle.inconsistent_districts() {
            warn!(district = %district, "District has models or capacity but not both");
        }

        info!(
            dir = %self.dir.display(),
            generation = %models.generation,
            trained_at = %models.trained_at,
            districts = handle.len(),
            "Model store loaded"
        );

        Ok(handle)
    }
}

#[async_trait]
impl<M> ArtifactSink<M> for ArtifactStore
where
    M: Serialize + Send + Sync,
{
    async fn persist(&self, trained: &TrainedStore<M>) -> Result<(), DomainError> {
        let generation = Uuid::new_v4();

        let models = serde_json::to_vec_pretty(&ModelsFileOut {
            generation,
            trained_at: Utc::now(),
            models: &trained.models,
        })
        .map_err(|e| DomainError::storage(format!("Failed to serialize models: {}", e)))?;

        let capacity = serde_json::to_vec_pretty(&CapacityFile {
            generation,
            capacity: trained.capacity.clone(),
        })
        .map_err(|e| DomainError::storage(format!("Failed to serialize capacity: {}", e)))?;

        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || write_pair(&dir, generation, &models, &capacity))
            .await
            .map_err(|e| DomainError::storage(format!("Write task failed: {}", e)))??;

        info!(
            dir = %self.dir.display(),
            %generation,
            districts = trained.models.len(),
            "Model store persisted"
        );

        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, DomainError> {
    let raw = fs::read(path).map_err(|e| {
        DomainError::not_trained(format!("cannot read {}: {}", path.display(), e))
    })?;

    serde_json::from_slice(&raw).map_err(|e| {
        DomainError::not_trained(format!("cannot parse {}: {}", path.display(), e))
    })
}

/// Both temp files are durable before either rename happens
fn write_pair(dir: &Path, generation: Uuid, models: &[u8], capacity: &[u8]) -> Result<(), DomainError> {
    fs::create_dir_all(dir).map_err(|e| io_error("create", dir, e))?;

    let models_tmp = dir.join(format!(".{}.{}.tmp", MODELS_FILE, generation));
    let capacity_tmp = dir.join(format!(".{}.{}.tmp", CAPACITY_FILE, generation));

    let result = write_synced(&capacity_tmp, capacity)
        .and_then(|_| write_synced(&models_tmp, models))
        .and_then(|_| {
            fs::rename(&capacity_tmp, dir.join(CAPACITY_FILE))
                .map_err(|e| io_error("rename", &capacity_tmp, e))
        })
        .and_then(|_| {
            fs::rename(&models_tmp, dir.join(MODELS_FILE))
                .map_err(|e| io_error("rename", &models_tmp, e))
        });

    if result.is_err() {
        let _ = fs::remove_file(&capacity_tmp);
        let _ = fs::remove_file(&models_tmp);
        return result;
    }

    // Directory fsync is not supported everywhere
    if let Ok(handle) = File::open(dir) {
        let _ = handle.sync_all();
    }

    Ok(())
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), DomainError> {
    let mut file = File::create(path).map_err(|e| io_error("create", path, e))?;
    file.write_all(bytes).map_err(|e| io_error("write", path, e))?;
    file.sync_all().map_err(|e| io_error("sync", path, e))
}

fn io_error(action: &str, path: &Path, error: std::io::Error) -> DomainError {
    DomainError::storage(format!("Failed to {} {}: {}", action, path.display(), error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::forecast::{ExternalReading, ForecastEngine};
    use crate::domain::regression::{
        RegressionFitter, TrainingSeries, TrendRegression, TrendRegressionFitter,
    };
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn fitted(regressors: &[&str], intercept: f64) -> TrendRegression {
        let mut series = TrainingSeries::new(regressors.iter().copied());
        for day in 0..10 {
            let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap() + chrono::Duration::days(day);
            let mut row = crate::domain::regression::FeatureRow::new(date);
            for (i, name) in regressors.iter().enumerate() {
                row.insert(*name, 5.0 + (day % 3) as f64 + i as f64 * 100.0);
            }
            series.push(row, intercept + 2.0 * day as f64);
        }
        TrendRegressionFitter::new().fit(&series).unwrap()
    }

    fn trained(districts: &[(&str, f64)]) -> TrainedStore<TrendRegression> {
        let mut store = TrainedStore {
            models: BTreeMap::new(),
            capacity: BTreeMap::new(),
        };
        for (name, capacity) in districts {
            let district = District::new(*name).unwrap();
            store.models.insert(
                district.clone(),
                TrainedTriple {
                    load: fitted(&["price_proxy", "installed_capacity"], 1800.0),
                    price: fitted(&["load"], 8.0),
                    blackout: fitted(&["load", "installed_capacity"], 12.0),
                },
            );
            store.capacity.insert(district, *capacity);
        }
        store
    }

    #[test]
    fn test_missing_files_are_not_trained() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let err = store.load::<TrendRegression>().unwrap_err();
        assert!(matches!(err, DomainError::StoreNotTrained { .. }));
    }

    #[tokio::test]
    async fn test_persist_then_load() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("artifacts"));

        store
            .persist(&trained(&[("Kolkata", 2000.0), ("Mumbai", 5000.0)]))
            .await
            .unwrap();

        let handle = store.load::<TrendRegression>().unwrap();
        assert_eq!(handle.len(), 2);
        let names: Vec<&str> = handle.districts().iter().map(|d| d.as_str()).collect();
        assert_eq!(names, vec!["Kolkata", "Mumbai"]);
        assert_eq!(
            handle.capacity_for(&District::new("Mumbai").unwrap()).unwrap(),
            5000.0
        );

        let result = ForecastEngine::new()
            .forecast(&handle, "Kolkata", "2025-03-12", &ExternalReading::new(7.0))
            .unwrap();
        assert!(result.load().is_finite());

        let leftovers: Vec<_> = fs::read_dir(store.dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_loaded_models_predict_identically() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let original = trained(&[("Delhi", 7000.0)]);

        store.persist(&original).await.unwrap();
        let reloaded = store.load::<TrendRegression>().unwrap();

        let engine = ForecastEngine::new();
        let reading = ExternalReading::new(6.5);
        let before = engine
            .forecast(&original.clone().into_handle(), "Delhi", "2025-03-20", &reading)
            .unwrap();
        let after = engine
            .forecast(&reloaded, "Delhi", "2025-03-20", &reading)
            .unwrap();

        assert_eq!(before.load(), after.load());
        assert_eq!(before.price(), after.price());
        assert_eq!(before.blackout_chance(), after.blackout_chance());
    }

    #[tokio::test]
    async fn test_mismatched_generation_is_not_trained() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        store.persist(&trained(&[("Kolkata", 2000.0)])).await.unwrap();
        let first_capacity = fs::read(store.capacity_path()).unwrap();
        store.persist(&trained(&[("Kolkata", 2000.0)])).await.unwrap();

        // Simulate a torn write: capacity from an older generation
        fs::write(store.capacity_path(), first_capacity).unwrap();

        let err = store.load::<TrendRegression>().unwrap_err();
        assert!(matches!(err, DomainError::StoreNotTrained { .. }));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_not_trained() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        store.persist(&trained(&[("Kolkata", 2000.0)])).await.unwrap();
        fs::write(store.models_path(), b"{ not json").unwrap();

        let err = store.load::<TrendRegression>().unwrap_err();
        assert!(matches!(err, DomainError::StoreNotTrained { .. }));
    }

    #[tokio::test]
    async fn test_missing_capacity_file_is_not_trained() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        store.persist(&trained(&[("Kolkata", 2000.0)])).await.unwrap();
        fs::remove_file(store.capacity_path()).unwrap();

        let err = store.load::<TrendRegression>().unwrap_err();
        assert!(matches!(err, DomainError::StoreNotTrained { .. }));
    }

    #[tokio::test]
    async fn test_missing_models_file_is_not_trained() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        store.persist(&trained(&[("Kolkata", 2000.0)])).await.unwrap();
        fs::remove_file(store.models_path()).unwrap();

        let err = store.load::<TrendRegression>().unwrap_err();
        assert!(matches!(err, DomainError::StoreNotTrained { .. }));
    }

    #[tokio::test]
    async fn test_malformed_model_is_not_trained() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        store.persist(&trained(&[("Kolkata", 2000.0)])).await.unwrap();

        let mut json: serde_json::Value =
            serde_json::from_slice(&fs::read(store.models_path()).unwrap()).unwrap();
        json["models"]["Kolkata"]["load"]["regressor_means"] = serde_json::json!([]);
        fs::write(store.models_path(), serde_json::to_vec(&json).unwrap()).unwrap();

        let err = store.load::<TrendRegression>().unwrap_err();
        assert!(matches!(err, DomainError::StoreNotTrained { .. }));
        assert!(err.to_string().contains("load model for Kolkata"));
    }

    #[tokio::test]
    async fn test_valid_empty_store_loads() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        store.persist(&trained(&[])).await.unwrap();

        let handle = store.load::<TrendRegression>().unwrap();
        assert!(handle.is_empty());
    }
}
