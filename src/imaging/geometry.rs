//! Geometric transforms: fit-policy resize and circular masking.
//!
//! Resampling uses `image::imageops::resize` with `Lanczos3`. The dimension
//! math lives in [`calculations`](super::calculations); this module only
//! executes a [`FitPlan`].

use super::buffer::PixelBuffer;
use super::calculations::{FitPlan, plan_fit};
use super::error::{ImagingError, Result};
use super::params::Fit;
use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Largest output the resizer will allocate (64 megapixels).
pub const MAX_OUTPUT_PIXELS: u64 = 64 * 1024 * 1024;

/// Resize `buffer` to `(width, height)` under `fit`.
pub fn resize(buffer: &PixelBuffer, width: u32, height: u32, fit: Fit) -> Result<PixelBuffer> {
    if width == 0 || height == 0 {
        return Err(ImagingError::InvalidDimension(format!(
            "target {width}x{height} must be positive"
        )));
    }
    if buffer.width() == 0 || buffer.height() == 0 {
        return Err(ImagingError::InvalidDimension("source image is empty".into()));
    }

    let plan = plan_fit(buffer.dimensions(), (width, height), fit);
    let (out_w, out_h) = plan.output;
    if out_w as u64 * out_h as u64 > MAX_OUTPUT_PIXELS {
        return Err(ImagingError::InvalidDimension(format!(
            "{fit} resize to {width}x{height} would produce {out_w}x{out_h}"
        )));
    }
    log::debug!(
        "resize {}x{} -> {}x{} ({fit})",
        buffer.width(),
        buffer.height(),
        out_w,
        out_h
    );
    Ok(buffer.derive(execute_plan(buffer.as_rgba(), &plan)))
}

fn execute_plan(source: &RgbaImage, plan: &FitPlan) -> RgbaImage {
    let (cx, cy, cw, ch) = plan.crop;
    let cropped;
    let region = if (cx, cy, cw, ch) == (0, 0, source.width(), source.height()) {
        source
    } else {
        cropped = imageops::crop_imm(source, cx, cy, cw, ch).to_image();
        &cropped
    };

    let scaled = if plan.scaled == region.dimensions() {
        region.clone()
    } else {
        imageops::resize(region, plan.scaled.0, plan.scaled.1, FilterType::Lanczos3)
    };

    if plan.output == plan.scaled {
        return scaled;
    }
    // Letterbox onto a transparent canvas
    let mut canvas = RgbaImage::new(plan.output.0, plan.output.1);
    imageops::replace(&mut canvas, &scaled, plan.offset.0, plan.offset.1);
    canvas
}

/// Zero the alpha of every pixel outside the inscribed circle.
///
/// Pixels straddling the edge get fractional coverage so the rim is
/// anti-aliased. The buffer must be square.
pub fn circular_mask(buffer: &PixelBuffer) -> Result<PixelBuffer> {
    let (width, height) = buffer.dimensions();
    if width != height {
        return Err(ImagingError::InvalidDimension(format!(
            "circular mask needs a square buffer, got {width}x{height}"
        )));
    }
    let radius = width as f32 / 2.0;
    let mut pixels = buffer.as_rgba().clone();
    for (x, y, pixel) in pixels.enumerate_pixels_mut() {
        let dx = x as f32 + 0.5 - radius;
        let dy = y as f32 + 0.5 - radius;
        let coverage = (radius - (dx * dx + dy * dy).sqrt() + 0.5).clamp(0.0, 1.0);
        if coverage < 1.0 {
            pixel[3] = (pixel[3] as f32 * coverage).round() as u8;
        }
    }
    Ok(buffer.derive(pixels))
}
