//! Segmentation mask production
//!
//! Turns a source image into a normalized confidence mask at the source's
//! exact dimensions: resize to the model's square inference resolution,
//! normalize to an NCHW tensor, run the saliency backend once, min-max
//! normalize the primary output map, and resize it back.

use crate::{
    config::PreprocessingConfig,
    error::{Result, StudioError},
    inference::InferenceBackend,
    types::{PipelineTimings, SegmentationMask},
};
use image::{imageops::FilterType, DynamicImage, GenericImageView};
use instant::Instant;
use ndarray::Array4;

/// Stateless mask production routines
pub struct MaskProducer;

impl MaskProducer {
    /// Produce a confidence mask for `image` at its exact dimensions
    ///
    /// # Errors
    /// - `ModelUnavailable` when the backend was never initialized
    /// - `Inference` when the forward pass fails
    pub fn produce(
        image: &DynamicImage,
        backend: &mut dyn InferenceBackend,
        preprocessing: &PreprocessingConfig,
        timings: &mut PipelineTimings,
    ) -> Result<SegmentationMask> {
        if !backend.is_initialized() {
            return Err(StudioError::model_unavailable(
                "segmentation backend is not initialized",
            ));
        }

        let (orig_width, orig_height) = image.dimensions();

        let preprocess_start = Instant::now();
        let input_tensor = Self::preprocess(image, preprocessing);
        timings.preprocessing_ms = preprocess_start.elapsed().as_millis() as u64;

        let inference_start = Instant::now();
        let output_tensor = backend
            .infer(&input_tensor)
            .map_err(|e| match e {
                StudioError::ModelUnavailable(_) => e,
                StudioError::Inference(_) => e,
                other => StudioError::inference(format!("saliency inference failed: {other}")),
            })?;
        timings.inference_ms = inference_start.elapsed().as_millis() as u64;

        let masking_start = Instant::now();
        let mask = Self::tensor_to_mask(&output_tensor, (orig_width, orig_height))?;
        timings.masking_ms = masking_start.elapsed().as_millis() as u64;

        Ok(mask)
    }

    /// Convert an image to a normalized `[1, 3, S, S]` inference tensor
    ///
    /// A working copy is resized to the square inference resolution with
    /// bilinear interpolation and normalized per channel. Grayscale inputs
    /// replicate the single channel into all three and use the red channel's
    /// statistics for every channel.
    #[must_use]
    pub fn preprocess(image: &DynamicImage, config: &PreprocessingConfig) -> Array4<f32> {
        let size = config.target_size;

        let grayscale = matches!(
            image,
            DynamicImage::ImageLuma8(_)
                | DynamicImage::ImageLumaA8(_)
                | DynamicImage::ImageLuma16(_)
                | DynamicImage::ImageLumaA16(_)
        );
        let (mean, std) = if grayscale {
            let red_mean = config.normalization_mean[0];
            let red_std = config.normalization_std[0];
            ([red_mean; 3], [red_std; 3])
        } else {
            (config.normalization_mean, config.normalization_std)
        };

        let resized = image.resize_exact(size, size, FilterType::Triangle);
        let rgb = resized.to_rgb8();

        let size_usize = size as usize;
        let mut tensor = Array4::<f32>::zeros((1, 3, size_usize, size_usize));
        for (y, row) in rgb.rows().enumerate() {
            for (x, pixel) in row.enumerate() {
                for channel in 0..3 {
                    let value = f32::from(pixel[channel]) / 255.0;
                    tensor[[0, channel, y, x]] = (value - mean[channel]) / std[channel];
                }
            }
        }

        tensor
    }

    /// Min-max normalize a raw prediction map in place
    ///
    /// Produces values strictly in [0, 1]. When the map is perfectly uniform
    /// (max == min) the result is all zeros rather than a division by zero;
    /// a uniform prediction carries no foreground signal.
    fn normalize_prediction(values: &mut [f32]) {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for &v in values.iter() {
            min = min.min(v);
            max = max.max(v);
        }

        let range = max - min;
        if range <= f32::EPSILON || !range.is_finite() {
            log::warn!("uniform saliency prediction, producing an empty mask");
            values.fill(0.0);
            return;
        }

        for v in values.iter_mut() {
            *v = (*v - min) / range;
        }
    }

    /// Convert the primary output map to a mask at the original dimensions
    fn tensor_to_mask(
        tensor: &Array4<f32>,
        original_dimensions: (u32, u32),
    ) -> Result<SegmentationMask> {
        let shape = tensor.shape();
        if shape.len() != 4 || shape[0] != 1 || shape[1] == 0 {
            return Err(StudioError::inference(format!(
                "invalid output tensor shape {shape:?}"
            )));
        }
        let map_height = shape[2];
        let map_width = shape[3];

        // Only the first channel of the primary map is used
        let mut values = Vec::with_capacity(map_height * map_width);
        for y in 0..map_height {
            for x in 0..map_width {
                values.push(tensor[[0, 0, y, x]]);
            }
        }

        Self::normalize_prediction(&mut values);

        let bytes: Vec<u8> = values
            .iter()
            .map(|&v| (v.clamp(0.0, 1.0) * 255.0) as u8)
            .collect();

        let mask = SegmentationMask::new(bytes, (map_width as u32, map_height as u32));
        let (orig_width, orig_height) = original_dimensions;
        if mask.dimensions == (orig_width, orig_height) {
            Ok(mask)
        } else {
            mask.resize(orig_width, orig_height)
        }
    }
}
