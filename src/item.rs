//! Collage items: one visual layer placed on the output canvas

use crate::error::{CollageError, Result};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Largest width or height a layer is ever scaled to, in pixels
pub const MAX_LAYER_SIDE: u32 = 4096;

/// Where an item came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Uploaded photo with its background removed
    Photo,
    /// First image search hit for a keyword, background removed
    Search,
    /// Built-in sticker glyph
    Sticker,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Photo => write!(f, "photo"),
            Self::Search => write!(f, "search"),
            Self::Sticker => write!(f, "sticker"),
        }
    }
}

/// Explicit position, size and rotation of an item on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Left edge in canvas pixels (may be negative or past the canvas)
    pub x: i32,
    /// Top edge in canvas pixels (may be negative or past the canvas)
    pub y: i32,
    /// Target width in pixels; height follows the aspect ratio
    pub width: u32,
    /// Counter-clockwise rotation in degrees
    #[serde(default)]
    pub rotation: f32,
}

impl Placement {
    #[must_use]
    pub fn new(x: i32, y: i32, width: u32) -> Self {
        Self {
            x,
            y,
            width,
            rotation: 0.0,
        }
    }

    #[must_use]
    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    /// Check the width is within `1..=MAX_LAYER_SIDE` and the rotation is finite
    ///
    /// # Errors
    /// - `InvalidInput` naming the offending field
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.width > MAX_LAYER_SIDE {
            return Err(CollageError::invalid_input(format!(
                "layer width {} must be between 1 and {}",
                self.width, MAX_LAYER_SIDE
            )));
        }
        if !self.rotation.is_finite() {
            return Err(CollageError::invalid_input("layer rotation must be a finite angle"));
        }
        Ok(())
    }
}

/// A decoded bitmap with transparency plus its display metadata
#[derive(Debug, Clone)]
pub struct CollageItem {
    pub id: Uuid,
    pub name: String,
    pub kind: ItemKind,
    pub image: RgbaImage,
    /// `None` lets the layout choose size and position at render time
    pub placement: Option<Placement>,
}

impl CollageItem {
    pub fn new<S: Into<String>>(name: S, kind: ItemKind, image: RgbaImage) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            image,
            placement: None,
        }
    }

    #[must_use]
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = Some(placement);
        self
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Height of this item when scaled to `width`, preserving aspect ratio
    #[must_use]
    pub fn scaled_height(&self, width: u32) -> u32 {
        let (w, h) = self.image.dimensions();
        scaled_height(w, h, width)
    }

    /// `width` clamped so neither scaled side exceeds [`MAX_LAYER_SIDE`]
    #[must_use]
    pub fn bounded_width(&self, width: u32) -> u32 {
        let width = width.clamp(1, MAX_LAYER_SIDE);
        let (w, h) = self.image.dimensions();
        if self.scaled_height(width) <= MAX_LAYER_SIDE || h == 0 {
            return width;
        }
        // Tall items: shrink until the height fits
        let fitted = u64::from(MAX_LAYER_SIDE) * u64::from(w) / u64::from(h);
        u32::try_from(fitted).unwrap_or(width).clamp(1, width)
    }
}

/// `original_height * new_width / original_width`, truncated, never below 1
#[must_use]
pub fn scaled_height(original_width: u32, original_height: u32, new_width: u32) -> u32 {
    if original_width == 0 {
        return 1;
    }
    let h = u64::from(original_height) * u64::from(new_width) / u64::from(original_width);
    u32::try_from(h).unwrap_or(u32::MAX).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_height_preserves_aspect_ratio() {
        assert_eq!(scaled_height(800, 600, 400), 300);
        assert_eq!(scaled_height(1000, 333, 350), 116);
        assert_eq!(scaled_height(10, 1, 3), 1);
    }

    #[test]
    fn test_item_scaled_height() {
        let item = CollageItem::new("cat", ItemKind::Photo, RgbaImage::new(200, 100));
        assert_eq!(item.scaled_height(500), 250);
        assert!(item.placement.is_none());
    }

    #[test]
    fn test_placement_serde_defaults_rotation() {
        let placement: Placement = serde_json::from_str(r#"{"x":10,"y":-5,"width":300}"#).unwrap();
        assert_eq!(placement, Placement::new(10, -5, 300));
    }

    #[test]
    fn test_placement_validate_bounds_width() {
        assert!(Placement::new(0, 0, 1).validate().is_ok());
        assert!(Placement::new(0, 0, MAX_LAYER_SIDE).validate().is_ok());
        assert!(Placement::new(0, 0, 0).validate().is_err());
        assert!(Placement::new(0, 0, MAX_LAYER_SIDE + 1).validate().is_err());
        assert!(Placement::new(0, 0, 4_000_000_000).validate().is_err());
        assert!(Placement::new(0, 0, 10).with_rotation(f32::NAN).validate().is_err());
    }

    #[test]
    fn test_bounded_width_caps_both_sides() {
        let square = CollageItem::new("sq", ItemKind::Photo, RgbaImage::new(10, 10));
        assert_eq!(square.bounded_width(500), 500);
        assert_eq!(square.bounded_width(0), 1);
        assert_eq!(square.bounded_width(4_000_000_000), MAX_LAYER_SIDE);

        let tower = CollageItem::new("tower", ItemKind::Photo, RgbaImage::new(10, 1000));
        let width = tower.bounded_width(500);
        assert_eq!(width, 40);
        assert!(tower.scaled_height(width) <= MAX_LAYER_SIDE);
    }

    #[test]
    fn test_item_ids_are_unique() {
        let a = CollageItem::new("a", ItemKind::Sticker, RgbaImage::new(1, 1));
        let b = CollageItem::new("a", ItemKind::Sticker, RgbaImage::new(1, 1));
        assert_ne!(a.id, b.id);
    }
}
