//! Tract backend implementation for segmentation models
//!
//! Tract is a pure Rust ONNX inference engine, so segmentation-based removal
//! works without native runtime libraries.

use super::segmentation::InferenceBackend;
use crate::error::{CollageError, Result};
use ndarray::Array4;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tract_onnx::prelude::*;
use tracing::{debug, info};

/// Type alias for the complex Tract model type to reduce complexity warnings
type TractModel = RunnableModel<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Tract backend running an ONNX segmentation model on the CPU
pub struct TractBackend {
    model_path: PathBuf,
    input_size: u32,
    model: Option<TractModel>,
}

impl TractBackend {
    #[must_use]
    pub fn new(model_path: PathBuf, input_size: u32) -> Self {
        Self {
            model_path,
            input_size,
            model: None,
        }
    }

    fn load_model(&mut self) -> Result<Duration> {
        let start = Instant::now();
        let size = self.input_size as usize;

        info!("🚀 Loading segmentation model {}", self.model_path.display());

        let model = tract_onnx::onnx()
            .model_for_path(&self.model_path)
            .map_err(|e| CollageError::model(format!("Failed to load ONNX model: {e}")))?
            .with_input_fact(0, f32::fact([1, 3, size, size]).into())
            .map_err(|e| CollageError::model(format!("Failed to set model input shape: {e}")))?
            .into_optimized()
            .map_err(|e| CollageError::model(format!("Failed to optimize model: {e}")))?
            .into_runnable()
            .map_err(|e| CollageError::model(format!("Failed to create runnable model: {e}")))?;

        self.model = Some(model);
        Ok(start.elapsed())
    }
}

impl InferenceBackend for TractBackend {
    fn initialize(&mut self) -> Result<Option<Duration>> {
        if self.model.is_some() {
            return Ok(None);
        }
        self.load_model().map(Some)
    }

    fn infer(&mut self, input: &Array4<f32>) -> Result<Array4<f32>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| CollageError::inference("Tract model not initialized"))?;

        let start = Instant::now();
        let data = input
            .as_slice()
            .ok_or_else(|| CollageError::inference("input tensor is not contiguous"))?;
        let tensor = Tensor::from_shape(input.shape(), data)
            .map_err(|e| CollageError::inference(format!("Failed to build input tensor: {e}")))?;

        let outputs = model
            .run(tvec!(tensor.into()))
            .map_err(|e| CollageError::inference(format!("Tract inference failed: {e}")))?;
        let output = outputs
            .first()
            .ok_or_else(|| CollageError::inference("No output tensor found"))?;

        let shape = output.shape().to_vec();
        let values = output
            .as_slice::<f32>()
            .map_err(|e| CollageError::inference(format!("Failed to read output tensor: {e}")))?
            .to_vec();

        let [n, c, h, w] = shape.as_slice() else {
            return Err(CollageError::inference(format!(
                "Expected 4D output tensor, got {}D",
                shape.len()
            )));
        };
        let mask = Array4::from_shape_vec((*n, *c, *h, *w), values)
            .map_err(|e| CollageError::inference(format!("Failed to reshape output: {e}")))?;

        debug!(
            "✅ Tract inference completed in {}ms, output {:?}",
            start.elapsed().as_millis(),
            mask.shape()
        );
        Ok(mask)
    }

    fn is_initialized(&self) -> bool {
        self.model.is_some()
    }

    fn name(&self) -> &str {
        "tract"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uninitialized_backend() {
        let mut backend = TractBackend::new(PathBuf::from("missing.onnx"), 64);
        assert!(!backend.is_initialized());
        assert!(backend.infer(&Array4::zeros((1, 3, 64, 64))).is_err());
    }

    #[test]
    fn test_missing_model_fails_gracefully() {
        let mut backend = TractBackend::new(PathBuf::from("/nonexistent/model.onnx"), 64);
        assert!(matches!(backend.initialize(), Err(CollageError::Model(_))));
        assert!(!backend.is_initialized());
    }
}
