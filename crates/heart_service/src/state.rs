//! Process-wide model state.
//!
//! The model and its column schema are loaded once before the server starts
//! and shared read-only by every request. A failed load leaves the service
//! running in the [`ModelState::Unavailable`] state instead of aborting.

use std::sync::Arc;

use anyhow::{Context, bail};
use burn::prelude::Backend;
use config::ServiceConfig;
use feature_aligner::{ColumnSchema, FeatureRecord, align};
use ml_model::{BurnClassifier, Classifier};
use tracing::{error, info};

/// Number of labels a heart disease classifier must produce.
pub const BINARY_CLASSES: usize = 2;

/// A loaded classifier together with the column order it was trained on.
pub struct ModelHandle {
    classifier: Box<dyn Classifier>,
    schema: ColumnSchema,
}

impl ModelHandle {
    /// Pairs a classifier with its schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema width differs from the classifier's
    /// input width, or if the classifier is not binary.
    pub fn new(classifier: Box<dyn Classifier>, schema: ColumnSchema) -> anyhow::Result<Self> {
        if schema.len() != classifier.input_width() {
            bail!(
                "column schema has {} columns but the model expects {} features",
                schema.len(),
                classifier.input_width()
            );
        }

        if classifier.num_classes() != BINARY_CLASSES {
            bail!(
                "model predicts {} classes but a binary classifier is required",
                classifier.num_classes()
            );
        }

        Ok(Self { classifier, schema })
    }

    /// Loads the model and column schema artifacts.
    ///
    /// # Errors
    ///
    /// Returns an error if either artifact is missing or unreadable, if they
    /// disagree on the feature width, or if the model is not binary.
    pub fn load<B: Backend>(config: &ServiceConfig, device: B::Device) -> anyhow::Result<Self> {
        let schema = ColumnSchema::load(&config.columns_path())?;
        let classifier = BurnClassifier::<B>::from_artifacts(&config.model_path(), device)
            .context("failed to load heart model")?;

        Self::new(Box::new(classifier), schema)
    }

    pub const fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    /// Aligns the record to the schema and runs inference.
    ///
    /// # Errors
    ///
    /// Returns an error if a schema column holds a non-numeric value or
    /// inference fails.
    pub fn predict(&self, record: &FeatureRecord) -> anyhow::Result<u8> {
        let row = align(record, &self.schema)?;
        self.classifier.predict(row.as_slice())
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Model availability for the lifetime of the process.
#[derive(Debug)]
pub enum ModelState {
    Ready(ModelHandle),
    Unavailable,
}

/// Shared handle captured by the HTTP routes.
pub type SharedModelState = Arc<ModelState>;

impl ModelState {
    /// Loads the model artifacts, falling back to [`ModelState::Unavailable`]
    /// on any failure.
    pub fn load<B: Backend>(config: &ServiceConfig, device: B::Device) -> Self {
        match ModelHandle::load::<B>(config, device) {
            Ok(handle) => {
                info!(
                    model = %config.model_path().display(),
                    columns = handle.schema().len(),
                    "Heart disease model loaded"
                );
                Self::Ready(handle)
            }
            Err(e) => {
                error!(
                    artifact_dir = %config.artifact_dir.display(),
                    "Could not load heart disease model: {e:#}"
                );
                Self::Unavailable
            }
        }
    }

    pub const fn handle(&self) -> Option<&ModelHandle> {
        match self {
            Self::Ready(handle) => Some(handle),
            Self::Unavailable => None,
        }
    }

    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;
    use burn::backend::ndarray::NdArrayDevice;
    use ml_model::{HeartModelConfig, save_model};
    use serde_json::json;

    use super::*;

    type TestBackend = NdArray;

    fn write_artifacts(config: &ServiceConfig, columns: &[&str], input_size: usize) {
        write_artifacts_with(config, columns, HeartModelConfig::new(input_size));
    }

    fn write_artifacts_with(
        config: &ServiceConfig,
        columns: &[&str],
        model_config: HeartModelConfig,
    ) {
        let device = NdArrayDevice::default();
        let model = model_config.init::<TestBackend>(&device);
        save_model(model, &model_config, &config.model_path()).expect("save model");

        ColumnSchema::new(columns.iter().map(ToString::to_string).collect())
            .expect("schema")
            .save(&config.columns_path())
            .expect("save schema");
    }

    #[test]
    fn test_load_ready_and_predict() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ServiceConfig::default().with_artifact_dir(dir.path());
        write_artifacts(&config, &["age", "sex", "chol"], 3);

        let state = ModelState::load::<TestBackend>(&config, NdArrayDevice::default());
        assert!(state.is_ready());

        let handle = state.handle().expect("ready");
        let record = match json!({"age": 54, "sex": 1}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        let first = handle.predict(&record).expect("predicts");
        let second = handle.predict(&record).expect("predicts");
        assert!(first <= 1);
        assert_eq!(first, second);

        let empty = handle.predict(&FeatureRecord::new()).expect("empty records still predict");
        assert!(empty <= 1);
    }

    #[test]
    fn test_missing_artifacts_are_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ServiceConfig::default().with_artifact_dir(dir.path());

        let state = ModelState::load::<TestBackend>(&config, NdArrayDevice::default());
        assert!(!state.is_ready());
        assert!(state.handle().is_none());
    }

    #[test]
    fn test_missing_columns_are_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ServiceConfig::default().with_artifact_dir(dir.path());
        write_artifacts(&config, &["age"], 1);
        std::fs::remove_file(config.columns_path()).expect("remove schema");

        let state = ModelState::load::<TestBackend>(&config, NdArrayDevice::default());
        assert!(!state.is_ready());
    }

    #[test]
    fn test_width_mismatch_is_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ServiceConfig::default().with_artifact_dir(dir.path());
        write_artifacts(&config, &["age", "sex"], 3);

        let state = ModelState::load::<TestBackend>(&config, NdArrayDevice::default());
        assert!(!state.is_ready());
    }

    #[test]
    fn test_non_binary_model_is_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ServiceConfig::default().with_artifact_dir(dir.path());
        write_artifacts_with(
            &config,
            &["age", "sex", "chol"],
            HeartModelConfig::new(3).with_num_classes(5),
        );

        let state = ModelState::load::<TestBackend>(&config, NdArrayDevice::default());
        assert!(!state.is_ready());
    }
}
