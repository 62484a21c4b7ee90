#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

//! # Collage Maker
//!
//! Build "favorite things" collages: photos with their backgrounds removed,
//! images found by keyword search, and sticker glyphs, layered on a fixed-size
//! canvas and exported as PNG.
//!
//! ## Features
//!
//! - **Layer list**: ordered per-session items; later layers paint on top
//! - **Background removal**: colour-key heuristic or an ONNX segmentation model (Tract)
//! - **Image search**: `DuckDuckGo` keyword search, first hit downloaded and cut out
//! - **Stickers**: heart, star, ribbon, clover and fire drawn as vector shapes
//! - **Layouts**: seedable random placement or explicit per-layer placement with rotation
//! - **CLI Integration**: one-shot and interactive modes (enable with `cli` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use collage_maker::{
//!     CollageConfig, CollageImporter, CollageSession, Compositor, Sticker, save_png,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = CollageConfig::builder().seed(42).build()?;
//! let mut session = CollageSession::new("minji")?;
//! let mut importer = CollageImporter::from_config(&config).await?;
//!
//! importer.import_files(&mut session, &["cat.jpg"]);
//! importer.import_search(&mut session, &["IU", "Hanni"]).await;
//! CollageImporter::add_sticker(&mut session, Sticker::Heart, config.sticker_size);
//! session.move_up(2)?;
//!
//! let canvas = Compositor::from_config(&config).render(&session)?;
//! let path = save_png(&canvas, &config.output_dir, session.user_name())?;
//! println!("saved {}", path.display());
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `tract` (default): segmentation-model background removal with the pure Rust Tract engine
//! - `cli` (default): command-line interface and progress display
//! - `tracing-json`, `tracing-files`: extra log formats and destinations for the CLI
//!
//! To use only as a library without CLI dependencies:
//!
//! ```toml
//! [dependencies]
//! collage-maker = { version = "0.1", default-features = false, features = ["tract"] }
//! ```

#[cfg(feature = "cli")]
pub mod cli;
pub mod compositor;
pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod importer;
pub mod item;
pub mod manifest;
pub mod removal;
pub mod search;
pub mod services;
pub mod session;
pub mod sticker;
#[cfg(feature = "cli")]
pub mod tracing_config;

pub use compositor::{resize_to_width, rotate_expanded, Compositor, ResolvedPlacement};
pub use config::{
    CanvasConfig, CollageConfig, CollageConfigBuilder, LayoutMode, RemovalSettings, RemoverKind,
    SearchSettings,
};
pub use error::{CollageError, Result};
pub use export::{encode_png, export_filename, save_png};
pub use fetch::{HttpImageFetcher, ImageFetcher};
pub use importer::{CollageImporter, ImportFailure, ImportReport};
pub use item::{scaled_height, CollageItem, ItemKind, Placement, MAX_LAYER_SIDE};
pub use manifest::{CollageManifest, KeywordList, LayerPlacement};
pub use removal::{
    create_remover, BackgroundRemover, ColorKeyRemover, InferenceBackend, ModelStore,
    PassthroughRemover, PreprocessingConfig, SegmentationRemover,
};
#[cfg(feature = "tract")]
pub use removal::TractBackend;
pub use search::{parse_keywords, DuckDuckGoSearch, ImageSearchProvider, SearchHit};
pub use services::{
    ImportStage, NoOpProgressReporter, ProgressReporter, ProgressTracker, ProgressUpdate,
    TracingProgressReporter,
};
pub use session::CollageSession;
pub use sticker::Sticker;

#[cfg(feature = "cli")]
pub use tracing_config::{
    events, spans, TracingConfig, TracingFormat, TracingGuard, TracingOutput,
};

/// Build a whole collage from a manifest: import everything, apply pinned
/// placements and render the canvas
///
/// Import failures do not abort the build; they are returned in the report,
/// and placements for failed sources are skipped.
///
/// # Examples
/// ```rust,no_run
/// use collage_maker::{build_from_manifest, save_png, CollageConfig, CollageManifest};
///
/// # async fn example() -> anyhow::Result<()> {
/// let manifest = CollageManifest::from_json_file("collage.json")?;
/// let config = manifest.config.clone().unwrap_or_default();
/// let (session, canvas, report) = build_from_manifest(&manifest, &config).await?;
/// save_png(&canvas, &config.output_dir, session.user_name())?;
/// println!("{} failures", report.failures.len());
/// # Ok(())
/// # }
/// ```
pub async fn build_from_manifest(
    manifest: &CollageManifest,
    config: &CollageConfig,
) -> Result<(CollageSession, image::RgbaImage, ImportReport)> {
    let importer = CollageImporter::from_config(config).await?;
    build_with_importer(manifest, config, importer).await
}

/// Same as [`build_from_manifest`] with a caller-supplied importer
pub async fn build_with_importer(
    manifest: &CollageManifest,
    config: &CollageConfig,
    mut importer: CollageImporter,
) -> Result<(CollageSession, image::RgbaImage, ImportReport)> {
    let mut session = CollageSession::new(&manifest.user_name)?;
    let report = importer
        .import_manifest(&mut session, manifest, config.sticker_size)
        .await?;

    let canvas = Compositor::from_config(config).render(&session)?;
    Ok((session, canvas, report))
}
