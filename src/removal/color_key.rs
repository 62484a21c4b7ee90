//! Border flood-fill background removal
//!
//! Works well for product shots and clip-art on a plain backdrop. The
//! backdrop colour is the per-channel median of the border pixels; every
//! pixel connected to the border whose colour is within `tolerance` of it
//! becomes transparent. Enclosed regions of the same colour are kept.

use super::BackgroundRemover;
use crate::error::Result;
use image::{DynamicImage, RgbaImage};
use std::collections::VecDeque;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct ColorKeyRemover {
    tolerance: f32,
}

impl ColorKeyRemover {
    #[must_use]
    pub fn new(tolerance: f32) -> Self {
        Self {
            tolerance: tolerance.max(0.0),
        }
    }

    /// Median colour of the opaque border pixels, `None` if the border is fully transparent
    #[must_use]
    pub fn estimate_background(image: &RgbaImage) -> Option<[u8; 3]> {
        let mut channels: [Vec<u8>; 3] = [Vec::new(), Vec::new(), Vec::new()];
        for (x, y) in border_coordinates(image.width(), image.height()) {
            let pixel = image.get_pixel(x, y);
            if pixel[3] == 0 {
                continue;
            }
            for (channel, value) in channels.iter_mut().zip(pixel.0) {
                channel.push(value);
            }
        }

        if channels[0].is_empty() {
            return None;
        }

        let mut median = [0u8; 3];
        for (out, channel) in median.iter_mut().zip(channels.iter_mut()) {
            channel.sort_unstable();
            *out = channel[channel.len() / 2];
        }
        Some(median)
    }

    fn within_tolerance(&self, pixel: [u8; 4], background: [u8; 3]) -> bool {
        let distance_sq: f32 = pixel
            .iter()
            .zip(background)
            .map(|(&p, b)| {
                let d = f32::from(p) - f32::from(b);
                d * d
            })
            .sum();
        distance_sq <= self.tolerance * self.tolerance
    }
}

impl Default for ColorKeyRemover {
    fn default() -> Self {
        Self::new(48.0)
    }
}

impl BackgroundRemover for ColorKeyRemover {
    #[allow(clippy::indexing_slicing)] // visited has exactly width * height entries
    fn remove(&mut self, image: &DynamicImage) -> Result<RgbaImage> {
        let mut rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        let Some(background) = Self::estimate_background(&rgba) else {
            return Ok(rgba);
        };

        let index = |x: u32, y: u32| (y as usize) * (width as usize) + x as usize;
        let mut visited = vec![false; width as usize * height as usize];
        let mut queue = VecDeque::new();

        for (x, y) in border_coordinates(width, height) {
            if !visited[index(x, y)] && self.within_tolerance(rgba.get_pixel(x, y).0, background) {
                visited[index(x, y)] = true;
                queue.push_back((x, y));
            }
        }

        let mut cleared = 0usize;
        while let Some((x, y)) = queue.pop_front() {
            rgba.get_pixel_mut(x, y).0[3] = 0;
            cleared += 1;

            let neighbours = [
                (x.wrapping_sub(1), y),
                (x + 1, y),
                (x, y.wrapping_sub(1)),
                (x, y + 1),
            ];
            for (nx, ny) in neighbours {
                if nx >= width || ny >= height || visited[index(nx, ny)] {
                    continue;
                }
                if self.within_tolerance(rgba.get_pixel(nx, ny).0, background) {
                    visited[index(nx, ny)] = true;
                    queue.push_back((nx, ny));
                }
            }
        }

        debug!(
            background = ?background,
            cleared,
            total = width as usize * height as usize,
            "Color key flood fill finished"
        );
        Ok(rgba)
    }

    fn name(&self) -> &str {
        "color-key"
    }
}

fn border_coordinates(width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> {
    let top_bottom = (0..width).flat_map(move |x| [(x, 0), (x, height.saturating_sub(1))]);
    let left_right = (0..height).flat_map(move |y| [(0, y), (width.saturating_sub(1), y)]);
    top_bottom
        .chain(left_right)
        .filter(move |_| width > 0 && height > 0)
}
