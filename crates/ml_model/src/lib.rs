//! ML model crate for heart disease risk classification.
//!
//! This crate uses the Burn deep learning framework to define the binary
//! classifier the service serves, persist and restore its weights, and run
//! single-row inference behind the [`Classifier`] trait.

use burn::nn::{Linear, LinearConfig, Relu};
use burn::prelude::*;

mod checkpoint;
mod classifier;

pub use checkpoint::{load_model, model_config_path, save_model};
pub use classifier::{BurnClassifier, Classifier};

/// Configuration for the heart disease classifier.
#[derive(Config, Debug)]
pub struct HeartModelConfig {
    /// Number of input features. Must equal the column schema length.
    pub input_size: usize,
    /// Number of hidden units.
    #[config(default = 16)]
    pub hidden_size: usize,
    /// Number of output classes.
    #[config(default = 2)]
    pub num_classes: usize,
}

impl HeartModelConfig {
    /// Initializes a model with freshly initialized weights.
    pub fn init<B: Backend>(&self, device: &B::Device) -> HeartModel<B> {
        HeartModel {
            linear1: LinearConfig::new(self.input_size, self.hidden_size).init(device),
            linear_out: LinearConfig::new(self.hidden_size, self.num_classes).init(device),
            activation: Relu::new(),
        }
    }
}

/// The heart disease classification model.
///
/// A small feedforward network that maps an aligned feature row to one
/// logit per class. The predicted label is the index of the largest logit.
#[derive(Module, Debug)]
pub struct HeartModel<B: Backend> {
    linear1: Linear<B>,
    linear_out: Linear<B>,
    activation: Relu,
}

impl<B: Backend> HeartModel<B> {
    /// Forward pass through the network.
    ///
    /// # Arguments
    ///
    /// * `input` - Tensor of shape [`batch_size`, `input_size`]
    ///
    /// # Returns
    ///
    /// Tensor of shape [`batch_size`, `num_classes`] containing class logits.
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.linear1.forward(input);
        let x = self.activation.forward(x);
        self.linear_out.forward(x)
    }
}
