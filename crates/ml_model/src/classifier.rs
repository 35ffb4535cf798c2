//! Single-row inference.

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, bail};
use burn::prelude::*;
use burn::tensor::TensorData;

use crate::{HeartModel, HeartModelConfig, load_model};

/// A trained binary classifier.
///
/// Implementations are loaded once and shared read-only by every request.
pub trait Classifier: Send + Sync {
    /// Width of the row [`Classifier::predict`] expects.
    fn input_width(&self) -> usize;

    /// Number of distinct labels [`Classifier::predict`] can return.
    fn num_classes(&self) -> usize;

    /// Predicts the label of one aligned feature row.
    ///
    /// # Errors
    ///
    /// Returns an error if the row has the wrong width or inference fails.
    fn predict(&self, row: &[f32]) -> anyhow::Result<u8>;
}

/// [`Classifier`] backed by a Burn [`HeartModel`].
///
/// Burn modules are `Send` but not `Sync`, so the model sits behind a mutex
/// to be shared across request tasks. It is never replaced or mutated after
/// loading, so a lock poisoned by a panicking forward pass is still usable.
#[derive(Debug)]
pub struct BurnClassifier<B: Backend> {
    model: Mutex<HeartModel<B>>,
    config: HeartModelConfig,
    device: B::Device,
}

impl<B: Backend> BurnClassifier<B> {
    pub fn new(model: HeartModel<B>, config: HeartModelConfig, device: B::Device) -> Self {
        Self {
            model: Mutex::new(model),
            config,
            device,
        }
    }

    /// Loads the classifier from its persisted weights and config.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifacts are missing or unreadable.
    pub fn from_artifacts(path: &Path, device: B::Device) -> anyhow::Result<Self> {
        let (model, config) = load_model::<B>(path, &device)?;
        Ok(Self::new(model, config, device))
    }

    pub const fn config(&self) -> &HeartModelConfig {
        &self.config
    }
}

impl<B: Backend> Classifier for BurnClassifier<B> {
    fn input_width(&self) -> usize {
        self.config.input_size
    }

    fn num_classes(&self) -> usize {
        self.config.num_classes
    }

    fn predict(&self, row: &[f32]) -> anyhow::Result<u8> {
        if row.len() != self.config.input_size {
            bail!(
                "expected a row of {} features, got {}",
                self.config.input_size,
                row.len()
            );
        }

        let input = Tensor::<B, 2>::from_data(
            TensorData::new(row.to_vec(), [1, row.len()]),
            &self.device,
        );

        let model = self.model.lock().unwrap_or_else(PoisonError::into_inner);
        let logits = model.forward(input);
        drop(model);

        let class = logits
            .argmax(1)
            .into_data()
            .iter::<i64>()
            .next()
            .context("classifier produced no label")?;

        u8::try_from(class).with_context(|| format!("class index {class} out of range"))
    }
}
