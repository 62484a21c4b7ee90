//! Background removal strategies
//!
//! Every remover turns a decoded image into an RGBA image of the same size
//! whose background pixels are transparent:
//! - `PassthroughRemover` keeps the image as it is
//! - `ColorKeyRemover` flood-fills the border colour (no model needed)
//! - `SegmentationRemover` runs a segmentation model through an `InferenceBackend`

pub mod color_key;
pub mod model;
pub mod segmentation;

#[cfg(feature = "tract")]
pub mod tract;

use crate::{
    config::{RemovalSettings, RemoverKind, DEFAULT_MODEL_URL},
    error::Result,
};
use image::{DynamicImage, RgbaImage};

pub use color_key::ColorKeyRemover;
pub use model::ModelStore;
pub use segmentation::{InferenceBackend, PreprocessingConfig, SegmentationRemover};

#[cfg(feature = "tract")]
pub use tract::TractBackend;

/// Turns an opaque photo into one with a transparent background
pub trait BackgroundRemover: Send {
    /// Remove the background; the result has the input's dimensions
    ///
    /// # Errors
    /// - Model inference failures
    /// - Invalid model output
    fn remove(&mut self, image: &DynamicImage) -> Result<RgbaImage>;

    /// Short identifier used in logs
    fn name(&self) -> &str;
}

/// Leaves images untouched apart from the RGBA conversion
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughRemover;

impl BackgroundRemover for PassthroughRemover {
    fn remove(&mut self, image: &DynamicImage) -> Result<RgbaImage> {
        Ok(image.to_rgba8())
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// Build the remover selected by `settings`
///
/// The segmentation remover resolves (and, for repository URLs, downloads)
/// its model before returning.
///
/// # Errors
/// - Model download or loading failures
/// - Segmentation requested in a build without the `tract` feature
pub async fn create_remover(settings: &RemovalSettings) -> Result<Box<dyn BackgroundRemover>> {
    match settings.kind {
        RemoverKind::None => Ok(Box::new(PassthroughRemover)),
        RemoverKind::ColorKey => Ok(Box::new(ColorKeyRemover::new(settings.tolerance))),
        RemoverKind::Segmentation => create_segmentation_remover(settings).await,
    }
}

#[cfg(feature = "tract")]
async fn create_segmentation_remover(
    settings: &RemovalSettings,
) -> Result<Box<dyn BackgroundRemover>> {
    let source = settings.model.as_deref().unwrap_or(DEFAULT_MODEL_URL);
    let store = ModelStore::new()?;
    let model_path = store.resolve(source).await?;

    let preprocessing = PreprocessingConfig::from_settings(settings);
    let backend = TractBackend::new(model_path, preprocessing.target_size);
    let mut remover = SegmentationRemover::new(Box::new(backend), preprocessing);
    remover.initialize()?;
    Ok(Box::new(remover))
}

#[cfg(not(feature = "tract"))]
async fn create_segmentation_remover(
    settings: &RemovalSettings,
) -> Result<Box<dyn BackgroundRemover>> {
    let _ = (settings, DEFAULT_MODEL_URL);
    Err(crate::error::CollageError::invalid_config(
        "segmentation background removal requires the 'tract' feature",
    ))
}
