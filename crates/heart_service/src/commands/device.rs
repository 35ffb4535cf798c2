use burn::backend::NdArray;
use burn::backend::ndarray::NdArrayDevice;
use tracing::info;

/// Backend used for serving predictions.
pub type InferenceBackend = NdArray;

/// Initializes the CPU device inference runs on.
///
/// This function only exists to be able to change the device at a single location.
pub fn init_device() -> NdArrayDevice {
    info!("Initializing NdArray CPU device...");
    NdArrayDevice::default()
}
