//! Fixed pixel filters.
//!
//! | Filter | Implementation |
//! |---|---|
//! | `grayscale` | Rec. 709 luma, integer weights (exactly idempotent) |
//! | `sepia` | [`modulate`]: saturation × 0.5, hue + 30° |
//! | `vintage` | [`modulate`]: brightness × 0.8, saturation × 0.7, then `sharpen` |
//! | `blur` | `image::imageops::blur`, σ = 5 |
//! | `sharpen` | `image::imageops::unsharpen`, single pass |
//!
//! Alpha is carried through unchanged by the color filters.

use super::buffer::PixelBuffer;
use super::params::{FilterKind, Sharpening};
use image::imageops;

/// Blur radius (Gaussian sigma) for the `blur` filter.
pub const BLUR_SIGMA: f32 = 5.0;

/// HSV adjustment factors, applied per pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Modulation {
    /// Multiplier on value (brightness).
    pub brightness: f32,
    /// Multiplier on saturation.
    pub saturation: f32,
    /// Hue rotation in degrees.
    pub hue: f32,
}

impl Modulation {
    pub const SEPIA: Modulation = Modulation {
        brightness: 1.0,
        saturation: 0.5,
        hue: 30.0,
    };

    pub const VINTAGE: Modulation = Modulation {
        brightness: 0.8,
        saturation: 0.7,
        hue: 0.0,
    };
}

/// Apply `kind` to a copy of `buffer`.
pub fn apply(buffer: &PixelBuffer, kind: FilterKind) -> PixelBuffer {
    match kind {
        FilterKind::Grayscale => grayscale(buffer),
        FilterKind::Sepia => modulate(buffer, Modulation::SEPIA),
        FilterKind::Vintage => sharpen(&modulate(buffer, Modulation::VINTAGE)),
        FilterKind::Blur => blur(buffer),
        FilterKind::Sharpen => sharpen(buffer),
    }
}

pub fn grayscale(buffer: &PixelBuffer) -> PixelBuffer {
    let mut pixels = buffer.as_rgba().clone();
    for pixel in pixels.pixels_mut() {
        let [r, g, b, _] = pixel.0;
        let luma = (2126 * r as u32 + 7152 * g as u32 + 722 * b as u32 + 5000) / 10000;
        let luma = luma.min(255) as u8;
        pixel[0] = luma;
        pixel[1] = luma;
        pixel[2] = luma;
    }
    buffer.derive(pixels)
}

pub fn modulate(buffer: &PixelBuffer, modulation: Modulation) -> PixelBuffer {
    let mut pixels = buffer.as_rgba().clone();
    for pixel in pixels.pixels_mut() {
        let (h, s, v) = rgb_to_hsv(pixel[0], pixel[1], pixel[2]);
        let h = (h + modulation.hue).rem_euclid(360.0);
        let s = (s * modulation.saturation).clamp(0.0, 1.0);
        let v = (v * modulation.brightness).clamp(0.0, 1.0);
        let (r, g, b) = hsv_to_rgb(h, s, v);
        pixel[0] = r;
        pixel[1] = g;
        pixel[2] = b;
    }
    buffer.derive(pixels)
}

pub fn blur(buffer: &PixelBuffer) -> PixelBuffer {
    buffer.derive(imageops::blur(buffer.as_rgba(), BLUR_SIGMA))
}

pub fn sharpen(buffer: &PixelBuffer) -> PixelBuffer {
    let s = Sharpening::standard();
    buffer.derive(imageops::unsharpen(buffer.as_rgba(), s.sigma, s.threshold))
}

/// RGB8 → (hue degrees, saturation 0–1, value 0–1).
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let saturation = if max == 0.0 { 0.0 } else { delta / max };
    (hue, saturation, max)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match (h / 60.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to_u8 = |channel: f32| ((channel + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_u8(r), to_u8(g), to_u8(b))
}
