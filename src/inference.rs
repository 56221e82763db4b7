//! Inference backend abstraction
//!
//! The segmentation model is an opaque capability: given a normalized NCHW
//! tensor, produce a single-channel saliency map. Implementations live in
//! [`crate::backends`]; the pipeline only ever talks to this trait, which
//! keeps the neural runtime swappable and the mask producer testable with a
//! stub.

use crate::{config::PipelineConfig, error::Result};
use instant::Duration;
use ndarray::Array4;

/// Trait for saliency inference backends
///
/// Backends are `Send` so the orchestrator can share one instance across
/// request threads behind a mutex. Inference is a read-only forward pass, but
/// the underlying numeric runtime is not assumed to support concurrent
/// execution on one model instance, so calls are serialized by the caller.
pub trait InferenceBackend: Send {
    /// Initialize the backend with the given configuration
    ///
    /// Returns the model load time when a model was actually loaded.
    ///
    /// # Errors
    /// - Model file missing or unparsable
    /// - Invalid configuration parameters
    fn initialize(&mut self, config: &PipelineConfig) -> Result<Option<Duration>>;

    /// Run a single forward pass on the input tensor
    ///
    /// Input shape is `[1, 3, S, S]`; the batch size is fixed at 1. The
    /// output is the primary confidence map, shape `[1, 1, H, W]`. Backends
    /// with multi-scale output bundles return only the finest map.
    ///
    /// # Errors
    /// - Backend not initialized
    /// - Model inference failures
    /// - Invalid input tensor dimensions
    fn infer(&mut self, input: &Array4<f32>) -> Result<Array4<f32>>;

    /// Expected input shape for this backend
    fn input_shape(&self) -> (usize, usize, usize, usize);

    /// Check if backend is initialized
    fn is_initialized(&self) -> bool;
}
