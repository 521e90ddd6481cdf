//! On-disk model store

mod store;

pub use store::{ArtifactStore, CAPACITY_FILE, MODELS_FILE};
