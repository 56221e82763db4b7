//! Mock backends for testing the pipeline without model files
//!
//! `MockSaliencyBackend` implements [`InferenceBackend`] with a synthetic,
//! fully deterministic response, so mask production and the orchestrator can
//! be tested end to end without a neural runtime.

use crate::{
    config::PipelineConfig,
    error::{Result, StudioError},
    inference::InferenceBackend,
};
use instant::Duration;
use ndarray::Array4;
use std::sync::{Arc, Mutex};

/// Synthetic saliency response shapes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockResponse {
    /// Every output value is the given constant. With min == max this
    /// exercises the degenerate min-max normalization path.
    Uniform(f32),
    /// A filled disc of confidence 1.0 centered in the map, 0.0 outside,
    /// with a linear falloff toward the disc edge.
    CenteredDisc,
    /// Top half 1.0, bottom half 0.0.
    TopHalf,
}

/// Mock saliency backend for deterministic tests
#[derive(Debug, Clone)]
pub struct MockSaliencyBackend {
    initialized: bool,
    response: MockResponse,
    should_fail_init: bool,
    should_fail_inference: bool,
    call_history: Arc<Mutex<Vec<String>>>,
}

impl MockSaliencyBackend {
    /// Create a mock backend with the given synthetic response
    #[must_use]
    pub fn new(response: MockResponse) -> Self {
        Self {
            initialized: false,
            response,
            should_fail_init: false,
            should_fail_inference: false,
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock backend that fails during initialization
    #[must_use]
    pub fn new_failing_init() -> Self {
        let mut backend = Self::new(MockResponse::CenteredDisc);
        backend.should_fail_init = true;
        backend
    }

    /// Create a mock backend that fails during inference
    #[must_use]
    pub fn new_failing_inference() -> Self {
        let mut backend = Self::new(MockResponse::CenteredDisc);
        backend.should_fail_inference = true;
        backend
    }

    /// Get the call history for verification in tests
    pub fn call_history(&self) -> Vec<String> {
        self.call_history.lock().unwrap().clone()
    }

    fn record_call(&self, method: &str) {
        if let Ok(mut history) = self.call_history.lock() {
            history.push(method.to_string());
        }
    }

    fn synthesize(&self, height: usize, width: usize) -> Array4<f32> {
        let mut output = Array4::<f32>::zeros((1, 1, height, width));
        match self.response {
            MockResponse::Uniform(value) => output.fill(value),
            MockResponse::CenteredDisc => {
                let center_x = width as f32 / 2.0;
                let center_y = height as f32 / 2.0;
                let radius = (width.min(height) as f32 / 3.0).max(1.0);
                for y in 0..height {
                    for x in 0..width {
                        let dx = x as f32 - center_x;
                        let dy = y as f32 - center_y;
                        let distance = (dx * dx + dy * dy).sqrt();
                        if distance < radius {
                            output[[0, 0, y, x]] = (radius - distance) / radius;
                        }
                    }
                }
            },
            MockResponse::TopHalf => {
                for y in 0..height / 2 {
                    for x in 0..width {
                        output[[0, 0, y, x]] = 1.0;
                    }
                }
            },
        }
        output
    }
}

impl InferenceBackend for MockSaliencyBackend {
    fn initialize(&mut self, _config: &PipelineConfig) -> Result<Option<Duration>> {
        self.record_call("initialize");
        if self.should_fail_init {
            return Err(StudioError::model_unavailable(
                "mock backend configured to fail initialization",
            ));
        }
        self.initialized = true;
        Ok(Some(Duration::from_millis(0)))
    }

    fn infer(&mut self, input: &Array4<f32>) -> Result<Array4<f32>> {
        self.record_call("infer");
        if self.should_fail_inference {
            return Err(StudioError::inference(
                "mock backend configured to fail inference",
            ));
        }
        if !self.initialized {
            return Err(StudioError::model_unavailable(
                "mock backend not initialized",
            ));
        }

        let shape = input.shape();
        if shape.len() != 4 || shape[0] != 1 || shape[1] != 3 {
            return Err(StudioError::inference(format!(
                "unexpected input tensor shape {shape:?}"
            )));
        }

        Ok(self.synthesize(shape[2], shape[3]))
    }

    fn input_shape(&self) -> (usize, usize, usize, usize) {
        (1, 3, 320, 320)
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;

    #[test]
    fn test_mock_backend_lifecycle() {
        let mut backend = MockSaliencyBackend::new(MockResponse::CenteredDisc);
        assert!(!backend.is_initialized());

        let config = PipelineConfig::default();
        backend.initialize(&config).unwrap();
        assert!(backend.is_initialized());

        let input = Array4::<f32>::zeros((1, 3, 320, 320));
        let output = backend.infer(&input).unwrap();
        assert_eq!(output.shape(), &[1, 1, 320, 320]);

        assert_eq!(backend.call_history(), vec!["initialize", "infer"]);
    }

    #[test]
    fn test_mock_backend_disc_response() {
        let mut backend = MockSaliencyBackend::new(MockResponse::CenteredDisc);
        backend.initialize(&PipelineConfig::default()).unwrap();

        let input = Array4::<f32>::zeros((1, 3, 64, 64));
        let output = backend.infer(&input).unwrap();

        // Center is confident, corner is not
        assert!(output[[0, 0, 32, 32]] > 0.5);
        assert_eq!(output[[0, 0, 0, 0]], 0.0);
    }

    #[test]
    fn test_mock_backend_rejects_bad_shape() {
        let mut backend = MockSaliencyBackend::new(MockResponse::CenteredDisc);
        backend.initialize(&PipelineConfig::default()).unwrap();

        let input = Array4::<f32>::zeros((2, 3, 320, 320));
        assert!(matches!(
            backend.infer(&input),
            Err(StudioError::Inference(_))
        ));
    }

    #[test]
    fn test_mock_backend_failure_modes() {
        let mut failing_init = MockSaliencyBackend::new_failing_init();
        assert!(failing_init.initialize(&PipelineConfig::default()).is_err());

        let mut failing_infer = MockSaliencyBackend::new_failing_inference();
        failing_infer.initialize(&PipelineConfig::default()).unwrap();
        let input = Array4::<f32>::zeros((1, 3, 320, 320));
        assert!(matches!(
            failing_infer.infer(&input),
            Err(StudioError::Inference(_))
        ));
    }

    #[test]
    fn test_uninitialized_inference_is_model_unavailable() {
        let mut backend = MockSaliencyBackend::new(MockResponse::Uniform(0.5));
        let input = Array4::<f32>::zeros((1, 3, 320, 320));
        assert!(matches!(
            backend.infer(&input),
            Err(StudioError::ModelUnavailable(_))
        ));
    }
}
