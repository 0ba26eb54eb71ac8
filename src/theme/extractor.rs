//! Derives a [`ThemePalette`] from a cover image.
//!
//! The image is downsampled to a small fixed grid before any statistics run,
//! so extraction cost is bounded regardless of the source resolution. The
//! sampling stride and quantization step below are tuning constants; the
//! visual result only needs to be close, not exact.

use crate::theme::{
    color::{adjust, is_dark, rgb_to_hex},
    ThemePalette,
};
use anyhow::Result;
use image::{imageops::FilterType, RgbaImage};
use log::warn;
use std::{collections::HashMap, path::Path};

/// Side length of the grid the image is resampled to before analysis.
pub const SAMPLE_SIZE: u32 = 50;

/// Channel values are rounded to multiples of this step when tallying the
/// dominant color.
pub const QUANTIZE_STEP: f32 = 10.0;

/// Accent colors are collected from every n-th pixel in raster order.
pub const ACCENT_STRIDE: usize = 25;

/// At most this many accent colors are kept.
pub const MAX_ACCENTS: usize = 5;

/// Builds a theme from the image at `path`, or the default theme when no
/// image is given or it cannot be decoded. Never fails.
pub fn extract_theme(path: Option<&Path>, brightness: f32, contrast: f32) -> ThemePalette {
    let Some(path) = path else {
        return ThemePalette::default();
    };

    try_extract(path, brightness, contrast).unwrap_or_else(|e| {
        warn!("theme extraction failed for {}: {e}", path.display());
        ThemePalette::default()
    })
}

fn try_extract(path: &Path, brightness: f32, contrast: f32) -> Result<ThemePalette> {
    let image = image::open(path)?
        .resize_exact(SAMPLE_SIZE, SAMPLE_SIZE, FilterType::Triangle)
        .to_rgba8();

    Ok(palette_from_image(&image, brightness, contrast))
}

/// The actual extraction algorithm, separated from decoding so it can run on
/// in-memory images.
pub fn palette_from_image(image: &RgbaImage, brightness: f32, contrast: f32) -> ThemePalette {
    let background = adjust(&dominant_color(image), brightness, contrast);

    // accents are pushed toward the opposite of the background so they
    // always read against it
    let accent_brightness = if is_dark(&background) { 150.0 } else { 50.0 };

    let tracks = accent_colors(image)
        .iter()
        .map(|hex| adjust(hex, accent_brightness, contrast))
        .collect();

    ThemePalette::new(background, tracks)
}

/// The most frequent quantized color, reported at the original precision of
/// the first pixel that fell into the winning bucket. Ties break toward the
/// bucket encountered first in raster order.
fn dominant_color(image: &RgbaImage) -> String {
    struct Bucket {
        count: usize,
        first_seen: usize,
        original: (u8, u8, u8),
    }

    let quantize = |v: u8| ((f32::from(v) / QUANTIZE_STEP).round() * QUANTIZE_STEP) as u16;

    let mut buckets: HashMap<(u16, u16, u16), Bucket> = HashMap::new();

    for (i, pixel) in image.pixels().enumerate() {
        let [r, g, b, _] = pixel.0;

        buckets
            .entry((quantize(r), quantize(g), quantize(b)))
            .and_modify(|bucket| bucket.count += 1)
            .or_insert(Bucket {
                count: 1,
                first_seen: i,
                original: (r, g, b),
            });
    }

    buckets
        .values()
        .max_by(|a, b| a.count.cmp(&b.count).then(b.first_seen.cmp(&a.first_seen)))
        .map_or_else(
            || rgb_to_hex(0, 0, 0),
            |bucket| {
                let (r, g, b) = bucket.original;
                rgb_to_hex(i32::from(r), i32::from(g), i32::from(b))
            },
        )
}

/// Distinct exact colors of every [`ACCENT_STRIDE`]-th pixel, in raster
/// order, capped at [`MAX_ACCENTS`].
fn accent_colors(image: &RgbaImage) -> Vec<String> {
    let mut accents = Vec::new();

    for pixel in image.pixels().step_by(ACCENT_STRIDE) {
        let [r, g, b, _] = pixel.0;
        let hex = rgb_to_hex(i32::from(r), i32::from(g), i32::from(b));

        if !accents.contains(&hex) {
            accents.push(hex);

            if accents.len() == MAX_ACCENTS {
                break;
            }
        }
    }

    accents
}
