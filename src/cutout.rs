//! Alpha compositing: mask to cutout
//!
//! Applies a confidence mask to its source image as a hard per-pixel
//! keep/drop decision. No partial transparency is ever produced: a pixel is
//! either the original RGB at full opacity or fully transparent with its RGB
//! discarded. Soft matting (alpha = mask value) would look better but changes
//! observable output, so the hard cutoff is kept.

use crate::{
    error::{Result, StudioError},
    types::SegmentationMask,
};
use image::{DynamicImage, Rgba, RgbaImage};

/// Stateless hard-cutoff alpha compositor
pub struct AlphaCompositor;

impl AlphaCompositor {
    /// Apply `mask` to `image`, keeping pixels whose mask value is strictly
    /// greater than `threshold`
    ///
    /// # Errors
    /// Returns `Composition` when image and mask dimensions differ; the mask
    /// producer is responsible for resizing first, so a mismatch here is an
    /// invariant violation.
    pub fn apply(
        image: &DynamicImage,
        mask: &SegmentationMask,
        threshold: u8,
    ) -> Result<RgbaImage> {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();

        if mask.dimensions != (width, height) {
            return Err(StudioError::dimension_mismatch(
                (width, height),
                mask.dimensions,
            ));
        }
        if mask.data.len() != (width as usize) * (height as usize) {
            return Err(StudioError::composition(
                "mask buffer length does not match its dimensions",
            ));
        }

        let mut result = RgbaImage::new(width, height);
        for (x, y, pixel) in rgba.enumerate_pixels() {
            let index = (y * width + x) as usize;
            if mask.data[index] > threshold {
                result.put_pixel(x, y, Rgba([pixel[0], pixel[1], pixel[2], 255]));
            } else {
                result.put_pixel(x, y, Rgba([0, 0, 0, 0]));
            }
        }

        Ok(result)
    }
}
