//! Core types for the customization pipeline

use crate::error::{Result, StudioError};
use image::{ImageBuffer, Luma, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Continuous foreground-confidence mask, one byte per pixel
///
/// Values are min-max normalized predictions scaled to 0..=255. The mask is
/// transient: it is produced at the source image's exact dimensions and
/// consumed immediately by the alpha compositor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationMask {
    /// Mask data as grayscale values (0-255)
    pub data: Vec<u8>,

    /// Mask dimensions (width, height)
    pub dimensions: (u32, u32),
}

impl SegmentationMask {
    /// Create a new segmentation mask
    #[must_use]
    pub fn new(data: Vec<u8>, dimensions: (u32, u32)) -> Self {
        Self { data, dimensions }
    }

    /// Create mask from a grayscale image
    #[must_use]
    pub fn from_image(image: &ImageBuffer<Luma<u8>, Vec<u8>>) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.as_raw().clone(), (width, height))
    }

    /// Convert mask to a grayscale image
    pub fn to_image(&self) -> Result<ImageBuffer<Luma<u8>, Vec<u8>>> {
        let (width, height) = self.dimensions;
        ImageBuffer::from_raw(width, height, self.data.clone()).ok_or_else(|| {
            StudioError::composition("mask buffer length does not match its dimensions")
        })
    }

    /// Resize the mask with bilinear interpolation
    pub fn resize(&self, new_width: u32, new_height: u32) -> Result<SegmentationMask> {
        let current = self.to_image()?;
        let resized = image::imageops::resize(
            &current,
            new_width,
            new_height,
            image::imageops::FilterType::Triangle,
        );
        Ok(SegmentationMask::from_image(&resized))
    }

    /// Ratio of pixels that would survive the given hard threshold
    #[must_use]
    pub fn foreground_ratio(&self, threshold: u8) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        let kept = self.data.iter().filter(|&&v| v > threshold).count();
        kept as f32 / self.data.len() as f32
    }

    /// Save mask as PNG
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let image = self.to_image()?;
        image.save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}

/// Per-stage timing breakdown for a pipeline run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineTimings {
    /// Preprocessing (resize, normalize, tensor conversion)
    pub preprocessing_ms: u64,

    /// Segmentation model forward pass
    pub inference_ms: u64,

    /// Mask normalization, resize, and alpha application
    pub masking_ms: u64,

    /// Background resolution and compositing
    pub background_ms: u64,

    /// Overlay template placement
    pub overlay_ms: u64,

    /// Total end-to-end time
    pub total_ms: u64,
}

impl PipelineTimings {
    /// Fraction of total time spent in the model forward pass
    #[must_use]
    pub fn inference_ratio(&self) -> f64 {
        if self.total_ms == 0 {
            0.0
        } else {
            self.inference_ms as f64 / self.total_ms as f64
        }
    }
}

/// Result of background removal: the RGBA cutout plus the mask it came from
#[derive(Debug, Clone)]
pub struct CutoutResult {
    /// Cutout image: original pixels where judged foreground, fully
    /// transparent elsewhere
    pub image: RgbaImage,

    /// The confidence mask the cutout was thresholded from
    pub mask: SegmentationMask,

    /// Source image dimensions
    pub original_dimensions: (u32, u32),

    /// Timing breakdown
    pub timings: PipelineTimings,
}

impl CutoutResult {
    /// Get cutout dimensions
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Save the cutout as PNG with alpha channel
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.image.save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }

    /// Encode the cutout as PNG bytes
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, image::ImageFormat::Png)?;
        Ok(buffer)
    }
}

/// Result of the combined remove-and-customize pipeline
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Final composed image
    pub image: RgbaImage,

    /// The confidence mask from the removal stage
    pub mask: SegmentationMask,

    /// Whether the customization stage was applied. False when no
    /// customization was requested, or when it failed and the pipeline fell
    /// back to the bare cutout (partial-success policy).
    pub customized: bool,

    /// Timing breakdown
    pub timings: PipelineTimings,
}

impl PipelineOutput {
    /// Get output dimensions
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Encode the output as PNG bytes
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, image::ImageFormat::Png)?;
        Ok(buffer)
    }
}
