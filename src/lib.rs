#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! # Product Studio
//!
//! A Rust library that turns arbitrary product photos into studio-ready
//! catalog images: segmentation-based background removal, backdrop
//! resolution and compositing, and model/mannequin/flat-lay template
//! placement.
//!
//! ## Pipeline
//!
//! - **Mask production**: a saliency model (U²-Net style, via Tract) turns
//!   the photo into a confidence mask at the photo's exact dimensions
//! - **Alpha compositing**: a hard per-pixel cutoff turns photo plus mask
//!   into an RGBA cutout
//! - **Background resolution**: the requested backdrop is satisfied from
//!   real catalog photography when available, procedurally generated
//!   otherwise, and the cutout is alpha-composited on top
//! - **Overlay placement**: the product is placed onto a standing-model,
//!   mannequin, or flat-lay template with per-kind anchoring, falling back
//!   to a drawn silhouette when no template asset exists
//!
//! Every stage that touches on-disk assets degrades gracefully: a missing
//! or corrupt asset is replaced by generated content, never surfaced as an
//! error.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use product_studio::{PipelineConfig, StudioProcessor, TractBackend};
//!
//! # fn example() -> product_studio::Result<()> {
//! let config = PipelineConfig::builder()
//!     .asset_root("assets")
//!     .model_path("models/u2net.onnx")
//!     .build()?;
//! let processor = StudioProcessor::new(config, Box::new(TractBackend::new()))?;
//!
//! let bytes = std::fs::read("product.jpg")?;
//! let output = processor.process_bytes(&bytes, Some("studio-light"), Some("mannequin"))?;
//! std::fs::write("catalog.png", output.to_png_bytes()?)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `tract` (default): pure Rust ONNX inference backend
//!
//! Without `tract`, callers supply their own [`InferenceBackend`]
//! implementation; the test backend in [`backends::test_utils`] is always
//! available.

pub mod assets;
pub mod backends;
pub mod background;
pub mod config;
pub mod cutout;
pub mod error;
pub mod inference;
pub mod masking;
pub mod overlay;
pub mod processor;
pub mod types;

// Public API exports
pub use assets::{AssetCatalog, FixedSelector, RandomSelector, Selector};
#[cfg(feature = "tract")]
pub use backends::TractBackend;
pub use background::{BackgroundResolver, BackgroundSpec, SolidColor, StudioVariant};
pub use config::{PipelineConfig, PipelineConfigBuilder, PreprocessingConfig};
pub use cutout::AlphaCompositor;
pub use error::{Result, StudioError};
pub use inference::InferenceBackend;
pub use masking::MaskProducer;
pub use overlay::{OverlayCompositor, OverlayKind};
pub use processor::StudioProcessor;
pub use types::{CutoutResult, PipelineOutput, PipelineTimings, SegmentationMask};

/// Remove the background from image bytes using the Tract backend
///
/// Convenience wrapper that constructs a single-use [`StudioProcessor`].
/// Servers handling many requests should construct the processor once and
/// call [`StudioProcessor::remove_background_bytes`] instead, so the model
/// is loaded a single time.
#[cfg(feature = "tract")]
pub fn remove_background_from_bytes(
    image_bytes: &[u8],
    config: &PipelineConfig,
) -> Result<CutoutResult> {
    let processor = StudioProcessor::new(config.clone(), Box::new(TractBackend::new()))?;
    processor.remove_background_bytes(image_bytes)
}

/// Run the full remove-and-customize pipeline on image bytes using the
/// Tract backend
///
/// Same single-use caveat as [`remove_background_from_bytes`].
#[cfg(feature = "tract")]
pub fn process_image_from_bytes(
    image_bytes: &[u8],
    config: &PipelineConfig,
    background: Option<&str>,
    overlay: Option<&str>,
) -> Result<PipelineOutput> {
    let processor = StudioProcessor::new(config.clone(), Box::new(TractBackend::new()))?;
    processor.process_bytes(image_bytes, background, overlay)
}

/// Customize an already-transparent RGBA image without running inference
///
/// Applies the background stage for a non-transparent spec and the overlay
/// stage for a known kind, in that order. Asset selection is uniformly
/// random.
pub fn customize_image(
    image: &image::RgbaImage,
    config: &PipelineConfig,
    background: Option<&str>,
    overlay: Option<&str>,
) -> Result<image::RgbaImage> {
    let catalog = AssetCatalog::scan(config.asset_root.clone());
    let mut selector = RandomSelector;
    let mut timings = PipelineTimings::default();

    let (result, _) = processor::apply_customization(
        image,
        background,
        overlay,
        &catalog,
        &mut selector,
        &mut timings,
    )?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customize_image_without_stages_is_identity() {
        let image = image::RgbaImage::from_pixel(16, 16, image::Rgba([5, 6, 7, 255]));
        let config = PipelineConfig::default();
        let result = customize_image(&image, &config, None, None).unwrap();
        assert_eq!(result.as_raw(), image.as_raw());
    }

    #[test]
    fn test_customize_image_applies_background() {
        let image = image::RgbaImage::new(16, 16);
        let config = PipelineConfig::builder()
            .asset_root("/definitely/not/a/real/path")
            .build()
            .unwrap();
        let result = customize_image(&image, &config, Some("black"), None).unwrap();
        assert!(result.pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }
}
