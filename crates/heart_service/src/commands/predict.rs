//! Predict command - runs one prediction on a JSON feature record file.

use std::path::Path;

use anyhow::{Context, Result};
use config::ServiceConfig;
use feature_aligner::FeatureRecord;
use serde::Serialize;
use tracing::info;

use super::{InferenceBackend, init_device};
use crate::state::ModelHandle;

/// Runs the predict command.
///
/// # Arguments
///
/// * `config` - Service configuration locating the model artifacts
/// * `input_path` - Path to a JSON object of feature values
///
/// # Errors
///
/// Returns an error if the model cannot be loaded, the input is not a JSON
/// object, or prediction fails.
pub fn run(config: &ServiceConfig, input_path: &Path) -> Result<()> {
    info!(
        input = %input_path.display(),
        artifacts = %config.artifact_dir.display(),
        "Predicting heart disease risk"
    );

    let handle = ModelHandle::load::<InferenceBackend>(config, init_device())?;

    let raw = std::fs::read_to_string(input_path)
        .with_context(|| format!("failed to read {}", input_path.display()))?;
    let record: FeatureRecord = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON object", input_path.display()))?;

    let missing: Vec<&str> = handle
        .schema()
        .iter()
        .filter(|column| !record.contains_key(*column))
        .collect();
    if !missing.is_empty() {
        info!(?missing, "Missing columns default to 0");
    }

    let label = handle.predict(&record)?;
    info!(label, assessment = interpret_label(label), "Prediction complete");

    println!("{}", serde_json::to_string(&Assessment::new(label))?);

    Ok(())
}

/// Result printed to stdout.
#[derive(Debug, Serialize)]
pub struct Assessment {
    pub prediction_result: u8,
    pub assessment: &'static str,
}

impl Assessment {
    pub const fn new(label: u8) -> Self {
        Self {
            prediction_result: label,
            assessment: interpret_label(label),
        }
    }
}

/// Interprets a predicted label as the assessment shown to users.
pub const fn interpret_label(label: u8) -> &'static str {
    match label {
        0 => "Fit",
        _ => "At Risk",
    }
}
