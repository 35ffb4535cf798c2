//! CLI command implementations.

mod device;
pub mod predict;
pub mod serve;

pub use device::{InferenceBackend, init_device};
