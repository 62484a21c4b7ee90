//! Configuration types for collage building

use crate::error::{CollageError, Result};
use crate::sticker::MIN_STICKER_SIZE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default canvas width in pixels
pub const DEFAULT_CANVAS_WIDTH: u32 = 1200;
/// Default canvas height in pixels
pub const DEFAULT_CANVAS_HEIGHT: u32 = 800;

/// Output canvas size and background
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    /// RGBA background fill
    pub background: [u8; 4],
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            background: [255, 255, 255, 255],
        }
    }
}

/// How items without an explicit placement are laid out
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum LayoutMode {
    /// Random width in `[min_width, max_width]` and a random position that keeps
    /// the item on the canvas where it fits
    Random {
        min_width: u32,
        max_width: u32,
        /// Rotation is drawn from `[-max_rotation, max_rotation]` degrees
        #[serde(default)]
        max_rotation: f32,
    },
    /// Only stored placements are used; unplaced items are centred at `default_width`
    Fixed { default_width: u32 },
}

impl Default for LayoutMode {
    fn default() -> Self {
        Self::Random {
            min_width: 350,
            max_width: 550,
            max_rotation: 0.0,
        }
    }
}

/// Background removal strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemoverKind {
    /// Keep images as they are
    None,
    /// Flood-fill the border colour (no model required)
    #[default]
    ColorKey,
    /// Neural segmentation model through the tract backend
    Segmentation,
}

impl std::fmt::Display for RemoverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::ColorKey => write!(f, "color-key"),
            Self::Segmentation => write!(f, "segmentation"),
        }
    }
}

impl std::str::FromStr for RemoverKind {
    type Err = CollageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" | "off" => Ok(Self::None),
            "color-key" | "colorkey" | "color_key" => Ok(Self::ColorKey),
            "segmentation" | "model" => Ok(Self::Segmentation),
            other => Err(CollageError::invalid_config(format!(
                "unknown background remover '{}' (expected none, color-key or segmentation)",
                other
            ))),
        }
    }
}

/// Settings for background removal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemovalSettings {
    pub kind: RemoverKind,
    /// Colour distance (0-441) under which a pixel counts as background
    pub tolerance: f32,
    /// Local `.onnx` file or `https://huggingface.co/...` repository
    pub model: Option<String>,
    /// Square model input edge
    pub target_size: u32,
    /// Per-channel normalisation mean on the 0-1 scale
    pub normalization_mean: [f32; 3],
    /// Per-channel normalisation std on the 0-1 scale
    pub normalization_std: [f32; 3],
}

/// ISNet general-use model repository
pub const DEFAULT_MODEL_URL: &str = "https://huggingface.co/imgly/isnet-general-onnx";

impl Default for RemovalSettings {
    fn default() -> Self {
        Self {
            kind: RemoverKind::default(),
            tolerance: 48.0,
            model: None,
            target_size: 1024,
            normalization_mean: [0.5, 0.5, 0.5],
            normalization_std: [1.0, 1.0, 1.0],
        }
    }
}

/// Settings for keyword image search and result download
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Timeout for each search request in seconds
    pub timeout_secs: u64,
    /// Pause before each search query in milliseconds
    pub delay_ms: u64,
    /// Candidates requested per keyword; only the first usable one is kept
    pub max_results: usize,
    /// Timeout for downloading the chosen image in seconds
    pub fetch_timeout_secs: u64,
    /// DuckDuckGo region code
    pub region: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            delay_ms: 0,
            max_results: 1,
            fetch_timeout_secs: 10,
            region: "wt-wt".to_string(),
        }
    }
}

/// Top-level configuration for building a collage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollageConfig {
    pub canvas: CanvasConfig,
    pub layout: LayoutMode,
    /// Seed for the random layout; `None` draws from entropy
    pub seed: Option<u64>,
    pub removal: RemovalSettings,
    pub search: SearchSettings,
    /// Edge length of rendered sticker glyphs
    pub sticker_size: u32,
    /// Directory the exported PNG is written to
    pub output_dir: PathBuf,
}

impl Default for CollageConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasConfig::default(),
            layout: LayoutMode::default(),
            seed: None,
            removal: RemovalSettings::default(),
            search: SearchSettings::default(),
            sticker_size: 256,
            output_dir: PathBuf::from("."),
        }
    }
}

impl CollageConfig {
    /// Create a new configuration builder
    ///
    /// # Examples
    /// ```rust
    /// use collage_maker::CollageConfig;
    ///
    /// let config = CollageConfig::builder()
    ///     .canvas_size(800, 600)
    ///     .seed(7)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.canvas.width, 800);
    /// ```
    #[must_use]
    pub fn builder() -> CollageConfigBuilder {
        CollageConfigBuilder::new()
    }

    /// Load a JSON configuration file; missing fields take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| CollageError::file_io_error("read config file", path, &e))?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            CollageError::invalid_config(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(CollageError::config_value_error(
                "canvas size",
                format!("{}x{}", self.canvas.width, self.canvas.height),
                "both dimensions > 0",
            ));
        }

        match self.layout {
            LayoutMode::Random {
                min_width,
                max_width,
                max_rotation,
            } => {
                if min_width == 0 || min_width > max_width {
                    return Err(CollageError::config_value_error(
                        "random layout width",
                        format!("{}..={}", min_width, max_width),
                        "0 < min_width <= max_width",
                    ));
                }
                if !(0.0..=180.0).contains(&max_rotation) {
                    return Err(CollageError::config_value_error(
                        "max rotation",
                        max_rotation,
                        "0-180",
                    ));
                }
            },
            LayoutMode::Fixed { default_width } => {
                if default_width == 0 {
                    return Err(CollageError::config_value_error(
                        "default width",
                        default_width,
                        "> 0",
                    ));
                }
            },
        }

        if !(MIN_STICKER_SIZE..=2048).contains(&self.sticker_size) {
            return Err(CollageError::config_value_error(
                "sticker size",
                self.sticker_size,
                "16-2048",
            ));
        }

        if !(0.0..=442.0).contains(&self.removal.tolerance) {
            return Err(CollageError::config_value_error(
                "color key tolerance",
                self.removal.tolerance,
                "0-441",
            ));
        }

        if self.removal.target_size == 0 {
            return Err(CollageError::config_value_error(
                "model target size",
                self.removal.target_size,
                "> 0",
            ));
        }

        if self.removal.normalization_std.iter().any(|s| *s <= 0.0) {
            return Err(CollageError::invalid_config(
                "normalization std values must be positive",
            ));
        }

        if self.search.max_results == 0 {
            return Err(CollageError::config_value_error(
                "max search results",
                self.search.max_results,
                ">= 1",
            ));
        }

        if self.search.timeout_secs == 0 || self.search.fetch_timeout_secs == 0 {
            return Err(CollageError::invalid_config("timeouts must be at least 1 second"));
        }

        Ok(())
    }
}

/// Builder for `CollageConfig` with validation at build time
#[derive(Debug, Clone, Default)]
pub struct CollageConfigBuilder {
    config: CollageConfig,
}

impl CollageConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_config(config: CollageConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn canvas_size(mut self, width: u32, height: u32) -> Self {
        self.config.canvas.width = width;
        self.config.canvas.height = height;
        self
    }

    #[must_use]
    pub fn background(mut self, rgba: [u8; 4]) -> Self {
        self.config.canvas.background = rgba;
        self
    }

    #[must_use]
    pub fn layout(mut self, layout: LayoutMode) -> Self {
        self.config.layout = layout;
        self
    }

    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn remover(mut self, kind: RemoverKind) -> Self {
        self.config.removal.kind = kind;
        self
    }

    #[must_use]
    pub fn tolerance(mut self, tolerance: f32) -> Self {
        self.config.removal.tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn model<S: Into<String>>(mut self, model: S) -> Self {
        self.config.removal.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn search_delay_ms(mut self, delay_ms: u64) -> Self {
        self.config.search.delay_ms = delay_ms;
        self
    }

    #[must_use]
    pub fn search_timeout_secs(mut self, secs: u64) -> Self {
        self.config.search.timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.search.fetch_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn max_results(mut self, max_results: usize) -> Self {
        self.config.search.max_results = max_results;
        self
    }

    #[must_use]
    pub fn sticker_size(mut self, size: u32) -> Self {
        self.config.sticker_size = size;
        self
    }

    #[must_use]
    pub fn output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn build(self) -> Result<CollageConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
