//! Segmentation-model background removal
//!
//! The image is letterboxed into the model's square input, the model predicts a
//! foreground probability per pixel, and the prediction is mapped back onto the
//! original pixel grid and used as the alpha channel.

use super::BackgroundRemover;
use crate::{
    config::RemovalSettings,
    error::{CollageError, Result},
};
use image::{imageops::FilterType, DynamicImage, ImageBuffer, Rgb, RgbImage, RgbaImage};
use ndarray::Array4;
use std::time::{Duration, Instant};
use tracing::{debug, info, span, Level};

/// Trait for inference backends
pub trait InferenceBackend: Send {
    /// Load the model; returns the load time on first initialization
    ///
    /// # Errors
    /// - Model loading or validation errors
    fn initialize(&mut self) -> Result<Option<Duration>>;

    /// Run inference on an NCHW input tensor, returning a `1x1xHxW` mask tensor
    ///
    /// # Errors
    /// - Backend not initialized
    /// - Model inference failures
    fn infer(&mut self, input: &Array4<f32>) -> Result<Array4<f32>>;

    fn is_initialized(&self) -> bool;

    fn name(&self) -> &str;
}

/// Model input geometry and normalisation
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessingConfig {
    pub target_size: u32,
    pub normalization_mean: [f32; 3],
    pub normalization_std: [f32; 3],
}

impl PreprocessingConfig {
    #[must_use]
    pub fn from_settings(settings: &RemovalSettings) -> Self {
        Self {
            target_size: settings.target_size,
            normalization_mean: settings.normalization_mean,
            normalization_std: settings.normalization_std,
        }
    }
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self::from_settings(&RemovalSettings::default())
    }
}

/// Coordinate transformation parameters for tensor-to-mask conversion
#[derive(Debug, Clone, Copy, PartialEq)]
struct Letterbox {
    scale: f32,
    offset_x: u32,
    offset_y: u32,
    scaled_width: u32,
    scaled_height: u32,
}

impl Letterbox {
    fn new(original: (u32, u32), target_size: u32) -> Self {
        let (w, h) = original;
        let target = target_size as f32;
        let scale = (target / w.max(1) as f32).min(target / h.max(1) as f32);
        let scaled_width = ((w as f32 * scale).round() as u32).clamp(1, target_size);
        let scaled_height = ((h as f32 * scale).round() as u32).clamp(1, target_size);
        Self {
            scale,
            offset_x: (target_size - scaled_width) / 2,
            offset_y: (target_size - scaled_height) / 2,
            scaled_width,
            scaled_height,
        }
    }
}

/// Removes backgrounds with a segmentation model
pub struct SegmentationRemover {
    backend: Box<dyn InferenceBackend>,
    preprocessing: PreprocessingConfig,
}

impl SegmentationRemover {
    pub fn new(backend: Box<dyn InferenceBackend>, preprocessing: PreprocessingConfig) -> Self {
        Self {
            backend,
            preprocessing,
        }
    }

    /// Load the backend model if that has not happened yet
    pub fn initialize(&mut self) -> Result<()> {
        if let Some(load_time) = self.backend.initialize()? {
            info!(
                "🧠 Segmentation backend '{}' ready in {}ms",
                self.backend.name(),
                load_time.as_millis()
            );
        }
        Ok(())
    }

    /// Letterbox `image` into the model input and normalise it to NCHW
    pub fn preprocess(image: &DynamicImage, config: &PreprocessingConfig) -> Result<Array4<f32>> {
        let target = config.target_size;
        if target == 0 {
            return Err(CollageError::invalid_config("model target size must be positive"));
        }

        let rgb = image.to_rgb8();
        let letterbox = Letterbox::new(rgb.dimensions(), target);
        let _span = span!(
            Level::DEBUG,
            "preprocessing",
            original_width = rgb.width(),
            original_height = rgb.height(),
            target = target
        )
        .entered();

        let resized = image::imageops::resize(
            &rgb,
            letterbox.scaled_width,
            letterbox.scaled_height,
            FilterType::Triangle,
        );
        let mut canvas: RgbImage = ImageBuffer::from_pixel(target, target, Rgb([255, 255, 255]));
        image::imageops::replace(
            &mut canvas,
            &resized,
            i64::from(letterbox.offset_x),
            i64::from(letterbox.offset_y),
        );

        let size = target as usize;
        let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
        for (x, y, pixel) in canvas.enumerate_pixels() {
            for channel in 0..3 {
                let value = (f32::from(pixel[channel]) / 255.0
                    - config.normalization_mean[channel])
                    / config.normalization_std[channel];
                if let Some(slot) = tensor.get_mut([0, channel, y as usize, x as usize]) {
                    *slot = value;
                }
            }
        }

        Ok(tensor)
    }

    /// Map a `1x1xHxW` model output back to an 8-bit mask of the original size
    pub fn tensor_to_mask(
        tensor: &Array4<f32>,
        original: (u32, u32),
        target_size: u32,
    ) -> Result<Vec<u8>> {
        let shape = tensor.shape();
        if shape.first() != Some(&1) || shape.get(1) != Some(&1) {
            return Err(CollageError::inference(format!(
                "expected a 1x1xHxW mask tensor, got {:?}",
                shape
            )));
        }
        let mask_height = shape.get(2).copied().unwrap_or(0);
        let mask_width = shape.get(3).copied().unwrap_or(0);
        if mask_height == 0 || mask_width == 0 {
            return Err(CollageError::inference("model returned an empty mask"));
        }

        // The mask may be smaller than the input; rescale into its grid
        let ratio_x = mask_width as f32 / target_size as f32;
        let ratio_y = mask_height as f32 / target_size as f32;
        let letterbox = Letterbox::new(original, target_size);
        let (width, height) = original;

        let mut mask = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                let tx =
                    ((x as f32 * letterbox.scale).round() + letterbox.offset_x as f32) * ratio_x;
                let ty =
                    ((y as f32 * letterbox.scale).round() + letterbox.offset_y as f32) * ratio_y;
                let value = tensor
                    .get([0, 0, ty as usize, tx as usize])
                    .copied()
                    .unwrap_or(0.0);
                mask.push((value.clamp(0.0, 1.0) * 255.0).round() as u8);
            }
        }

        Ok(mask)
    }

    /// Use the mask as alpha; fully masked pixels become transparent black
    #[must_use]
    pub fn apply_mask(image: &DynamicImage, mask: &[u8]) -> RgbaImage {
        let mut rgba = image.to_rgba8();
        for (pixel, &alpha) in rgba.pixels_mut().zip(mask) {
            if alpha == 0 {
                pixel.0 = [0, 0, 0, 0];
            } else {
                pixel.0[3] = alpha.min(pixel.0[3]);
            }
        }
        rgba
    }
}

impl BackgroundRemover for SegmentationRemover {
    fn remove(&mut self, image: &DynamicImage) -> Result<RgbaImage> {
        if !self.backend.is_initialized() {
            self.initialize()?;
        }

        let start = Instant::now();
        let input = Self::preprocess(image, &self.preprocessing)?;
        let output = self.backend.infer(&input)?;
        let mask = Self::tensor_to_mask(
            &output,
            (image.width(), image.height()),
            self.preprocessing.target_size,
        )?;
        let result = Self::apply_mask(image, &mask);

        debug!(
            backend = self.backend.name(),
            width = image.width(),
            height = image.height(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Segmentation removal finished"
        );
        Ok(result)
    }

    fn name(&self) -> &str {
        "segmentation"
    }
}
