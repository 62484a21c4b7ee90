//! Built-in sticker glyphs
//!
//! Stickers are drawn as filled vector shapes instead of emoji text so no
//! colour font has to be installed. Shapes are authored on a 100x100 grid and
//! scaled to the requested size.

use crate::{
    error::{CollageError, Result},
    item::{CollageItem, ItemKind},
};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_ellipse_mut, draw_polygon_mut};
use imageproc::point::Point;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Smallest sticker edge that keeps every polygon non-degenerate
pub const MIN_STICKER_SIZE: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sticker {
    Heart,
    Star,
    Ribbon,
    Clover,
    Fire,
}

impl Sticker {
    pub const ALL: [Sticker; 5] = [
        Sticker::Heart,
        Sticker::Star,
        Sticker::Ribbon,
        Sticker::Clover,
        Sticker::Fire,
    ];

    #[must_use]
    pub fn emoji(self) -> &'static str {
        match self {
            Self::Heart => "❤️",
            Self::Star => "⭐",
            Self::Ribbon => "🎀",
            Self::Clover => "🍀",
            Self::Fire => "🔥",
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Heart => "heart",
            Self::Star => "star",
            Self::Ribbon => "ribbon",
            Self::Clover => "clover",
            Self::Fire => "fire",
        }
    }

    /// Rasterize the glyph on a transparent `size` x `size` square
    #[must_use]
    pub fn render(self, size: u32) -> RgbaImage {
        let size = size.max(MIN_STICKER_SIZE);
        let mut canvas = RgbaImage::from_pixel(size, size, Rgba([0, 0, 0, 0]));
        let grid = Grid::new(size);

        match self {
            Self::Heart => draw_heart(&mut canvas, &grid),
            Self::Star => draw_star(&mut canvas, &grid),
            Self::Ribbon => draw_ribbon(&mut canvas, &grid),
            Self::Clover => draw_clover(&mut canvas, &grid),
            Self::Fire => draw_fire(&mut canvas, &grid),
        }

        canvas
    }

    /// Build a collage layer holding this sticker
    #[must_use]
    pub fn to_item(self, size: u32) -> CollageItem {
        CollageItem::new(self.emoji(), ItemKind::Sticker, self.render(size))
    }
}

impl std::fmt::Display for Sticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.emoji(), self.name())
    }
}

impl FromStr for Sticker {
    type Err = CollageError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let lowered = trimmed.to_lowercase();
        // Emoji may arrive with or without the variation selector
        let bare = trimmed.trim_end_matches('\u{fe0f}');

        Self::ALL
            .into_iter()
            .find(|sticker| {
                sticker.name() == lowered || sticker.emoji().trim_end_matches('\u{fe0f}') == bare
            })
            .ok_or_else(|| {
                CollageError::invalid_input(format!(
                    "unknown sticker '{}' (expected one of: heart, star, ribbon, clover, fire)",
                    trimmed
                ))
            })
    }
}

/// Maps the 100x100 authoring grid onto the output square
struct Grid {
    unit: f32,
}

impl Grid {
    fn new(size: u32) -> Self {
        Self {
            unit: size as f32 / 100.0,
        }
    }

    fn p(&self, x: f32, y: f32) -> Point<i32> {
        Point::new(self.s(x), self.s(y))
    }

    fn c(&self, x: f32, y: f32) -> (i32, i32) {
        (self.s(x), self.s(y))
    }

    fn s(&self, v: f32) -> i32 {
        (v * self.unit).round() as i32
    }

    fn polygon(&self, points: &[(f32, f32)]) -> Vec<Point<i32>> {
        let mut poly: Vec<Point<i32>> = points.iter().map(|&(x, y)| self.p(x, y)).collect();
        // draw_polygon_mut rejects a closing point equal to the first one
        while poly.len() > 1 && poly.first() == poly.last() {
            poly.pop();
        }
        poly
    }
}

fn fill(canvas: &mut RgbaImage, grid: &Grid, points: &[(f32, f32)], color: Rgba<u8>) {
    let poly = grid.polygon(points);
    if poly.len() >= 3 {
        draw_polygon_mut(canvas, &poly, color);
    }
}

fn draw_heart(canvas: &mut RgbaImage, grid: &Grid) {
    let red = Rgba([220, 20, 60, 255]);
    draw_filled_circle_mut(canvas, grid.c(30.0, 35.0), grid.s(22.0), red);
    draw_filled_circle_mut(canvas, grid.c(70.0, 35.0), grid.s(22.0), red);
    fill(canvas, grid, &[(9.0, 42.0), (91.0, 42.0), (50.0, 90.0)], red);
}

fn draw_star(canvas: &mut RgbaImage, grid: &Grid) {
    let gold = Rgba([255, 200, 0, 255]);
    let (cx, cy, outer, inner) = (50.0_f32, 52.0_f32, 48.0_f32, 20.0_f32);
    let points: Vec<(f32, f32)> = (0..10)
        .map(|i| {
            let radius = if i % 2 == 0 { outer } else { inner };
            let angle = (-90.0 + 36.0 * i as f32).to_radians();
            (cx + radius * angle.cos(), cy + radius * angle.sin())
        })
        .collect();
    fill(canvas, grid, &points, gold);
    // Fills the pentagon core when rounding thins it out at small sizes
    draw_filled_circle_mut(canvas, grid.c(cx, cy), grid.s(inner), gold);
}

fn draw_ribbon(canvas: &mut RgbaImage, grid: &Grid) {
    let pink = Rgba([255, 105, 180, 255]);
    let knot = Rgba([219, 68, 140, 255]);
    fill(canvas, grid, &[(50.0, 45.0), (8.0, 20.0), (8.0, 75.0)], pink);
    fill(canvas, grid, &[(50.0, 45.0), (92.0, 20.0), (92.0, 75.0)], pink);
    fill(
        canvas,
        grid,
        &[(44.0, 52.0), (30.0, 92.0), (42.0, 92.0), (50.0, 60.0)],
        pink,
    );
    fill(
        canvas,
        grid,
        &[(56.0, 52.0), (70.0, 92.0), (58.0, 92.0), (50.0, 60.0)],
        pink,
    );
    draw_filled_circle_mut(canvas, grid.c(50.0, 47.0), grid.s(12.0), knot);
}

fn draw_clover(canvas: &mut RgbaImage, grid: &Grid) {
    let green = Rgba([34, 139, 34, 255]);
    fill(
        canvas,
        grid,
        &[(48.0, 60.0), (52.0, 60.0), (62.0, 95.0), (57.0, 95.0)],
        green,
    );
    for (x, y) in [(36.0, 36.0), (64.0, 36.0), (36.0, 60.0), (64.0, 60.0)] {
        draw_filled_circle_mut(canvas, grid.c(x, y), grid.s(17.0), green);
    }
    draw_filled_circle_mut(canvas, grid.c(50.0, 48.0), grid.s(10.0), green);
}

fn draw_fire(canvas: &mut RgbaImage, grid: &Grid) {
    let orange = Rgba([255, 87, 34, 255]);
    let yellow = Rgba([255, 193, 7, 255]);
    fill(
        canvas,
        grid,
        &[
            (22.0, 65.0),
            (30.0, 30.0),
            (42.0, 45.0),
            (50.0, 5.0),
            (60.0, 40.0),
            (70.0, 25.0),
            (78.0, 65.0),
        ],
        orange,
    );
    draw_filled_circle_mut(canvas, grid.c(50.0, 65.0), grid.s(28.0), orange);
    fill(canvas, grid, &[(38.0, 70.0), (50.0, 40.0), (62.0, 70.0)], yellow);
    draw_filled_ellipse_mut(canvas, grid.c(50.0, 72.0), grid.s(14.0), grid.s(18.0), yellow);
}
