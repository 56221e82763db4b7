//! Tract backend for saliency model inference
//!
//! Runs U²-Net style ONNX saliency models with Tract, a pure Rust neural
//! network inference library. No C++ runtime or FFI boundary is involved, so
//! the backend is portable and memory safe by construction.

use crate::config::PipelineConfig;
use crate::error::{Result, StudioError};
use crate::inference::InferenceBackend;
use instant::{Duration, Instant};
use ndarray::Array4;
use tract_onnx::prelude::*;

/// Type alias for the complex Tract model type
type TractModel = RunnableModel<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Pure Rust inference backend for ONNX saliency models
pub struct TractBackend {
    model: Option<TractModel>,
    input_size: u32,
    initialized: bool,
}

impl TractBackend {
    /// Create a new uninitialized Tract backend
    #[must_use]
    pub fn new() -> Self {
        Self {
            model: None,
            input_size: 320,
            initialized: false,
        }
    }

    /// Load and optimize the model referenced by the configuration
    fn load_model(&mut self, config: &PipelineConfig) -> Result<Duration> {
        let model_load_start = Instant::now();

        let Some(ref model_path) = config.model_path else {
            return Err(StudioError::model_unavailable(
                "no model path configured for Tract backend",
            ));
        };

        let size = config.preprocessing.target_size;
        log::info!(
            "Loading saliency model from {} ({}x{} input)",
            model_path.display(),
            size,
            size
        );

        let model = onnx()
            .model_for_path(model_path)
            .map_err(|e| {
                StudioError::model_unavailable(format!(
                    "failed to load ONNX model '{}': {e}",
                    model_path.display()
                ))
            })?
            .with_input_fact(
                0,
                f32::fact([1, 3, size as usize, size as usize]).into(),
            )
            .map_err(|e| {
                StudioError::model_unavailable(format!("failed to set model input fact: {e}"))
            })?
            .into_optimized()
            .map_err(|e| {
                StudioError::model_unavailable(format!("failed to optimize model: {e}"))
            })?
            .into_runnable()
            .map_err(|e| {
                StudioError::model_unavailable(format!("failed to create runnable model: {e}"))
            })?;

        self.model = Some(model);
        self.input_size = size;
        self.initialized = true;

        let model_load_time = model_load_start.elapsed();
        log::info!(
            "Tract backend initialized in {:.2}ms",
            model_load_time.as_millis()
        );

        Ok(model_load_time)
    }
}

impl Default for TractBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceBackend for TractBackend {
    fn initialize(&mut self, config: &PipelineConfig) -> Result<Option<Duration>> {
        if self.initialized {
            return Ok(None);
        }
        let model_load_time = self.load_model(config)?;
        Ok(Some(model_load_time))
    }

    fn infer(&mut self, input: &Array4<f32>) -> Result<Array4<f32>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| StudioError::model_unavailable("Tract model not initialized"))?;

        log::debug!("Running Tract inference on tensor {:?}", input.shape());
        let inference_start = Instant::now();

        let input_tensor = Tensor::from(input.clone());

        // Saliency models emit a coarse-to-fine output bundle; only the
        // first (finest) map is consumed.
        let outputs = model
            .run(tvec![input_tensor.into()])
            .map_err(|e| StudioError::inference(format!("Tract inference failed: {e}")))?;

        let output_tensor = outputs
            .into_iter()
            .next()
            .ok_or_else(|| StudioError::inference("model produced no output tensor"))?
            .into_arc_tensor();

        let output_data = output_tensor
            .to_array_view::<f32>()
            .map_err(|e| StudioError::inference(format!("failed to read output tensor: {e}")))?;

        let output_shape = output_data.shape();
        if output_shape.len() != 4 {
            return Err(StudioError::inference(format!(
                "expected 4D output tensor, got {}D",
                output_shape.len()
            )));
        }

        let dims = (
            output_shape[0],
            output_shape[1],
            output_shape[2],
            output_shape[3],
        );
        let output_array =
            Array4::from_shape_vec(dims, output_data.to_owned().into_raw_vec_and_offset().0)
                .map_err(|e| {
                    StudioError::inference(format!("failed to reshape output tensor: {e}"))
                })?;

        log::debug!(
            "Tract inference completed in {:.2}ms, output {:?}",
            inference_start.elapsed().as_millis(),
            output_array.shape()
        );

        Ok(output_array)
    }

    fn input_shape(&self) -> (usize, usize, usize, usize) {
        (1, 3, self.input_size as usize, self.input_size as usize)
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tract_backend_creation() {
        let backend = TractBackend::new();
        assert!(!backend.is_initialized());
        assert_eq!(backend.input_shape(), (1, 3, 320, 320));
    }

    #[test]
    fn test_tract_backend_requires_model_path() {
        let mut backend = TractBackend::new();
        let config = PipelineConfig::default();
        assert!(matches!(
            backend.initialize(&config),
            Err(StudioError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn test_tract_backend_uninitialized_inference() {
        let mut backend = TractBackend::new();
        let input = Array4::<f32>::zeros((1, 3, 320, 320));
        assert!(matches!(
            backend.infer(&input),
            Err(StudioError::ModelUnavailable(_))
        ));
    }
}
