//! Canvas compositor: resizes, rotates and paints layers in list order
//!
//! Every render starts from a fresh canvas of the configured size. Items are
//! painted from the first to the last entry of the session, so later entries
//! cover earlier ones. Pixels that fall outside the canvas are clipped.

use crate::{
    config::{CanvasConfig, CollageConfig, LayoutMode},
    error::{CollageError, Result},
    item::{scaled_height, CollageItem, Placement, MAX_LAYER_SIDE},
    session::CollageSession,
};
use image::{imageops, imageops::FilterType, Rgba, RgbaImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Width used for unplaced items in fixed layout when nothing else is known
const FALLBACK_FIXED_WIDTH: u32 = 400;

/// Resize preserving aspect ratio so the result is exactly `width` wide
///
/// `width` is clamped to `1..=MAX_LAYER_SIDE`.
#[must_use]
pub fn resize_to_width(image: &RgbaImage, width: u32) -> RgbaImage {
    let width = width.clamp(1, MAX_LAYER_SIDE);
    let (w, h) = image.dimensions();
    let height = scaled_height(w, h, width);
    if (w, h) == (width, height) {
        return image.clone();
    }
    imageops::resize(image, width, height, FilterType::Lanczos3)
}

/// Rotate counter-clockwise by `degrees`, growing the canvas to the rotated
/// bounding box so no corner is cut off. Uncovered pixels are transparent.
#[must_use]
pub fn rotate_expanded(image: &RgbaImage, degrees: f32) -> RgbaImage {
    let normalized = degrees.rem_euclid(360.0);
    if normalized.abs() < f32::EPSILON || !degrees.is_finite() {
        return image.clone();
    }

    let (w, h) = image.dimensions();
    let radians = normalized.to_radians();
    let (sin, cos) = (radians.sin().abs(), radians.cos().abs());
    let new_w = (w as f32 * cos + h as f32 * sin).ceil().max(1.0) as u32;
    let new_h = (w as f32 * sin + h as f32 * cos).ceil().max(1.0) as u32;
    let side_w = new_w.max(w);
    let side_h = new_h.max(h);

    let mut padded = RgbaImage::from_pixel(side_w, side_h, Rgba([0, 0, 0, 0]));
    imageops::replace(
        &mut padded,
        image,
        i64::from((side_w - w) / 2),
        i64::from((side_h - h) / 2),
    );

    // imageproc rotates clockwise in image coordinates
    let rotated = rotate_about_center(
        &padded,
        -radians,
        Interpolation::Bilinear,
        Rgba([0, 0, 0, 0]),
    );

    if (side_w, side_h) == (new_w, new_h) {
        rotated
    } else {
        imageops::crop_imm(
            &rotated,
            (side_w - new_w) / 2,
            (side_h - new_h) / 2,
            new_w,
            new_h,
        )
        .to_image()
    }
}

/// Concrete geometry of one layer for a single render
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPlacement {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub rotation: f32,
}

/// Paints collage items onto a fixed-size canvas
#[derive(Debug, Clone)]
pub struct Compositor {
    canvas: CanvasConfig,
    layout: LayoutMode,
    seed: Option<u64>,
}

impl Compositor {
    #[must_use]
    pub fn new(canvas: CanvasConfig, layout: LayoutMode) -> Self {
        Self {
            canvas,
            layout,
            seed: None,
        }
    }

    /// Compositor for the canvas, layout and seed of `config`
    #[must_use]
    pub fn from_config(config: &CollageConfig) -> Self {
        Self::new(config.canvas, config.layout).with_seed(config.seed)
    }

    /// Fix the layout RNG so repeated renders give the same picture
    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn canvas(&self) -> &CanvasConfig {
        &self.canvas
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Render every item of the session onto a new canvas
    ///
    /// # Errors
    /// - `EmptyCollage` when the session has no items
    pub fn render(&self, session: &CollageSession) -> Result<RgbaImage> {
        self.render_items(session.items())
    }

    #[instrument(level = "debug", skip(self, items), fields(items = items.len()))]
    pub fn render_items(&self, items: &[CollageItem]) -> Result<RgbaImage> {
        if items.is_empty() {
            return Err(CollageError::EmptyCollage);
        }

        let start = Instant::now();
        let placements = self.plan(items);
        let mut canvas = RgbaImage::from_pixel(
            self.canvas.width,
            self.canvas.height,
            Rgba(self.canvas.background),
        );

        for (item, placement) in items.iter().zip(&placements) {
            Self::paint(&mut canvas, item, placement);
        }

        info!(
            "🖼️ Composited {} layers onto {}x{} canvas in {}ms",
            items.len(),
            self.canvas.width,
            self.canvas.height,
            start.elapsed().as_millis()
        );
        Ok(canvas)
    }

    /// Resolve the geometry of every item for one render
    ///
    /// Random placements draw from one RNG stream in list order, so a seeded
    /// compositor always plans the same layout for the same items.
    #[must_use]
    pub fn plan(&self, items: &[CollageItem]) -> Vec<ResolvedPlacement> {
        let mut rng = self.rng();
        items
            .iter()
            .map(|item| match item.placement {
                Some(placement) => Self::resolve_explicit(item, placement),
                None => self.resolve_auto(item, &mut rng),
            })
            .collect()
    }

    fn resolve_explicit(item: &CollageItem, placement: Placement) -> ResolvedPlacement {
        let width = item.bounded_width(placement.width);
        ResolvedPlacement {
            x: placement.x,
            y: placement.y,
            width,
            height: item.scaled_height(width),
            rotation: placement.rotation,
        }
    }

    fn resolve_auto(&self, item: &CollageItem, rng: &mut StdRng) -> ResolvedPlacement {
        let (canvas_w, canvas_h) = (self.canvas.width, self.canvas.height);
        match self.layout {
            LayoutMode::Random {
                min_width,
                max_width,
                max_rotation,
            } => {
                let width = item.bounded_width(rng.gen_range(min_width..=max_width).min(canvas_w));
                let height = item.scaled_height(width);
                let x = rng.gen_range(0..=canvas_w.saturating_sub(width));
                let y = rng.gen_range(0..=canvas_h.saturating_sub(height));
                let rotation = if max_rotation > 0.0 {
                    rng.gen_range(-max_rotation..=max_rotation)
                } else {
                    0.0
                };
                ResolvedPlacement {
                    x: x as i32,
                    y: y as i32,
                    width,
                    height,
                    rotation,
                }
            },
            LayoutMode::Fixed { default_width } => {
                let width = item.bounded_width(
                    if default_width == 0 {
                        FALLBACK_FIXED_WIDTH
                    } else {
                        default_width
                    }
                    .min(canvas_w),
                );
                let height = item.scaled_height(width);
                ResolvedPlacement {
                    x: (i64::from(canvas_w) - i64::from(width)).div_euclid(2) as i32,
                    y: (i64::from(canvas_h) - i64::from(height)).div_euclid(2) as i32,
                    width,
                    height,
                    rotation: 0.0,
                }
            },
        }
    }

    /// Paint one layer; a rotated layer stays centred on its unrotated box
    fn paint(canvas: &mut RgbaImage, item: &CollageItem, placement: &ResolvedPlacement) {
        let resized = resize_to_width(&item.image, placement.width);
        let layer = rotate_expanded(&resized, placement.rotation);

        let dx = (i64::from(layer.width()) - i64::from(resized.width())) / 2;
        let dy = (i64::from(layer.height()) - i64::from(resized.height())) / 2;
        let x = i64::from(placement.x) - dx;
        let y = i64::from(placement.y) - dy;

        debug!(
            name = %item.name,
            x,
            y,
            width = layer.width(),
            height = layer.height(),
            rotation = placement.rotation,
            "Painting layer"
        );
        imageops::overlay(canvas, &layer, x, y);
    }
}
