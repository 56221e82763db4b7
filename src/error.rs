//! Error types for the product studio pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, StudioError>;

/// Error types for the image customization pipeline
#[derive(Error, Debug)]
pub enum StudioError {
    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or undecodable input image
    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),

    /// The segmentation capability was never initialized
    #[error("Segmentation model unavailable: {0}")]
    ModelUnavailable(String),

    /// The segmentation capability was invoked but failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// A catalog asset exists but could not be read or decoded.
    /// Always recoverable: resolvers substitute generated content.
    #[error("Asset load error: {0}")]
    AssetLoad(String),

    /// Dimension mismatch or unexpected pixel format during blending.
    /// Indicates a pipeline invariant violation and is never swallowed.
    #[error("Composition error: {0}")]
    Composition(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StudioError {
    /// Create a new model-unavailable error
    pub fn model_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::ModelUnavailable(msg.into())
    }

    /// Create a new inference error
    pub fn inference<S: Into<String>>(msg: S) -> Self {
        Self::Inference(msg.into())
    }

    /// Create a new asset load error
    pub fn asset_load<S: Into<String>>(msg: S) -> Self {
        Self::AssetLoad(msg.into())
    }

    /// Create a new composition error
    pub fn composition<S: Into<String>>(msg: S) -> Self {
        Self::Composition(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an asset load error with path context
    pub fn asset_load_from_path<P: AsRef<std::path::Path>, E: std::fmt::Display>(
        path: P,
        error: E,
    ) -> Self {
        Self::AssetLoad(format!(
            "failed to load asset '{}': {}",
            path.as_ref().display(),
            error
        ))
    }

    /// Create a composition error describing a dimension mismatch
    pub fn dimension_mismatch(expected: (u32, u32), actual: (u32, u32)) -> Self {
        Self::Composition(format!(
            "dimension mismatch: expected {}x{}, got {}x{}",
            expected.0, expected.1, actual.0, actual.1
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = StudioError::model_unavailable("no backend configured");
        assert!(matches!(err, StudioError::ModelUnavailable(_)));

        let err = StudioError::asset_load("unreadable file");
        assert!(matches!(err, StudioError::AssetLoad(_)));
    }

    #[test]
    fn test_error_display() {
        let err = StudioError::inference("forward pass failed");
        assert_eq!(err.to_string(), "Inference error: forward pass failed");
    }

    #[test]
    fn test_dimension_mismatch_context() {
        let err = StudioError::dimension_mismatch((100, 150), (320, 320));
        let error_string = err.to_string();
        assert!(error_string.contains("100x150"));
        assert!(error_string.contains("320x320"));
    }

    #[test]
    fn test_asset_load_path_context() {
        let err = StudioError::asset_load_from_path(
            std::path::Path::new("/assets/backgrounds/studio-light-1.jpg"),
            "corrupt JPEG",
        );
        let error_string = err.to_string();
        assert!(error_string.contains("studio-light-1.jpg"));
        assert!(error_string.contains("corrupt JPEG"));
    }
}
