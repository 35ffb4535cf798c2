//! Persisted model artifacts.
//!
//! A model is stored as two files: the weights, written with Burn's named
//! msgpack recorder, and the [`HeartModelConfig`] as JSON next to them
//! (`heart_model.mpk` + `heart_model.config.json`).

use std::path::{Path, PathBuf};

use anyhow::Context;
use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use tracing::debug;

use crate::{HeartModel, HeartModelConfig};

type ArtifactRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

/// Returns the path of the config file stored alongside the weights.
#[must_use]
pub fn model_config_path(model_path: &Path) -> PathBuf {
    model_path.with_extension("config.json")
}

/// Saves the model weights and config.
///
/// # Arguments
///
/// * `model` - The model to save.
/// * `config` - The config the model was built from.
/// * `path` - Path of the weights file.
///
/// # Errors
///
/// Returns an error if either file cannot be written.
pub fn save_model<B: Backend>(
    model: HeartModel<B>,
    config: &HeartModelConfig,
    path: &Path,
) -> anyhow::Result<()> {
    let config_path = model_config_path(path);
    config
        .save(&config_path)
        .with_context(|| format!("failed to write model config {}", config_path.display()))?;

    model
        .save_file(path.to_path_buf(), &ArtifactRecorder::new())
        .map_err(|e| anyhow::anyhow!("failed to write model weights {}: {e:?}", path.display()))
}

/// Loads a model and its config from disk.
///
/// # Arguments
///
/// * `path` - Path of the weights file.
/// * `device` - The device to load the model to.
///
/// # Errors
///
/// Returns an error if either file is missing or unreadable, or if the
/// weights do not match the config.
pub fn load_model<B: Backend>(
    path: &Path,
    device: &B::Device,
) -> anyhow::Result<(HeartModel<B>, HeartModelConfig)> {
    let config_path = model_config_path(path);
    let config = HeartModelConfig::load(&config_path).map_err(|e| {
        anyhow::anyhow!("failed to read model config {}: {e:?}", config_path.display())
    })?;

    debug!(
        input_size = config.input_size,
        hidden_size = config.hidden_size,
        num_classes = config.num_classes,
        "Loaded model config"
    );

    let model = config
        .init::<B>(device)
        .load_file(path.to_path_buf(), &ArtifactRecorder::new(), device)
        .map_err(|e| anyhow::anyhow!("failed to read model weights {}: {e:?}", path.display()))?;

    Ok((model, config))
}
