//! Pipeline configuration and validation

use crate::error::{Result, StudioError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Inference preprocessing parameters
///
/// The values mirror the training-time normalization of U²-Net style saliency
/// models: a fixed square inference resolution and per-channel mean/std.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    /// Square inference resolution (width and height)
    pub target_size: u32,
    /// Per-channel normalization mean (RGB)
    pub normalization_mean: [f32; 3],
    /// Per-channel normalization std (RGB)
    pub normalization_std: [f32; 3],
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            target_size: 320,
            normalization_mean: [0.485, 0.456, 0.406],
            normalization_std: [0.229, 0.224, 0.225],
        }
    }
}

/// Configuration for the studio pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root directory of the on-disk asset catalog
    /// (`{root}/backgrounds/`, `{root}/models/`)
    pub asset_root: PathBuf,
    /// Mask byte threshold for the hard foreground cutoff.
    /// A pixel is kept when its mask value is strictly greater than this.
    pub foreground_threshold: u8,
    /// Preprocessing parameters for the segmentation model
    pub preprocessing: PreprocessingConfig,
    /// Path to the ONNX saliency model, when a file-backed backend is used
    pub model_path: Option<PathBuf>,
}

impl PipelineConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("assets"),
            foreground_threshold: 100,
            preprocessing: PreprocessingConfig::default(),
            model_path: None,
        }
    }
}

/// Builder for `PipelineConfig`
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
        }
    }

    #[must_use]
    pub fn asset_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.config.asset_root = root.into();
        self
    }

    #[must_use]
    pub fn foreground_threshold(mut self, threshold: u8) -> Self {
        self.config.foreground_threshold = threshold;
        self
    }

    #[must_use]
    pub fn preprocessing(mut self, preprocessing: PreprocessingConfig) -> Self {
        self.config.preprocessing = preprocessing;
        self
    }

    #[must_use]
    pub fn model_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.model_path = Some(path.into());
        self
    }

    /// Build the pipeline configuration
    ///
    /// # Errors
    ///
    /// Returns `StudioError::InvalidConfig` for:
    /// - A zero inference resolution
    /// - A zero normalization std (would divide by zero during preprocessing)
    pub fn build(self) -> Result<PipelineConfig> {
        if self.config.preprocessing.target_size == 0 {
            return Err(StudioError::invalid_config(
                "inference resolution must be non-zero",
            ));
        }
        if self
            .config
            .preprocessing
            .normalization_std
            .iter()
            .any(|&s| s == 0.0)
        {
            return Err(StudioError::invalid_config(
                "normalization std must be non-zero",
            ));
        }

        Ok(self.config)
    }
}

impl Default for PipelineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.foreground_threshold, 100);
        assert_eq!(config.preprocessing.target_size, 320);
        assert_eq!(
            config.preprocessing.normalization_mean,
            [0.485, 0.456, 0.406]
        );
        assert_eq!(
            config.preprocessing.normalization_std,
            [0.229, 0.224, 0.225]
        );
    }

    #[test]
    fn test_builder_chain() {
        let config = PipelineConfig::builder()
            .asset_root("/srv/studio/assets")
            .foreground_threshold(128)
            .build()
            .unwrap();

        assert_eq!(config.asset_root, PathBuf::from("/srv/studio/assets"));
        assert_eq!(config.foreground_threshold, 128);
    }

    #[test]
    fn test_builder_rejects_zero_resolution() {
        let result = PipelineConfig::builder()
            .preprocessing(PreprocessingConfig {
                target_size: 0,
                ..PreprocessingConfig::default()
            })
            .build();
        assert!(matches!(result, Err(StudioError::InvalidConfig(_))));
    }

    #[test]
    fn test_builder_rejects_zero_std() {
        let result = PipelineConfig::builder()
            .preprocessing(PreprocessingConfig {
                normalization_std: [0.229, 0.0, 0.225],
                ..PreprocessingConfig::default()
            })
            .build();
        assert!(matches!(result, Err(StudioError::InvalidConfig(_))));
    }
}
