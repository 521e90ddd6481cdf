//! Training pipeline - builds the persisted model store from provider history

mod pipeline;
mod record;

pub use pipeline::{
    ArtifactSink, SkippedDistrict, TrainedStore, TrainingPipeline, TrainingPlan, TrainingReport,
};
pub use record::{cascade_series, stage_series, TrainedTriple, TrainingRecord};
