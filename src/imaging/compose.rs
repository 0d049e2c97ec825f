//! Layering buffers onto a canvas.
//!
//! Composites are applied in call order; a later layer paints over an
//! earlier one. Overlay pixels falling outside the base are clipped.
//!
//! Blending is Porter-Duff "source over" in integer math, so opaque pixels
//! copy exactly and fully transparent ones are skipped.

use super::buffer::PixelBuffer;
use super::geometry::circular_mask;
use image::{Rgba, RgbaImage};

/// Alpha-blend `overlay` onto a copy of `base` with its top-left at `(x, y)`.
///
/// Fully transparent overlay pixels leave the base unchanged. Offsets may be
/// negative or beyond the base; whatever does not land on the base is dropped.
pub fn composite(base: &PixelBuffer, overlay: &PixelBuffer, x: i64, y: i64) -> PixelBuffer {
    let mut pixels = base.as_rgba().clone();
    overlay_into(&mut pixels, overlay.as_rgba(), x, y);
    base.derive(pixels)
}

/// Composite several layers in order.
pub fn composite_all<'a, I>(base: &PixelBuffer, layers: I) -> PixelBuffer
where
    I: IntoIterator<Item = (&'a PixelBuffer, i64, i64)>,
{
    let mut pixels = base.as_rgba().clone();
    for (layer, x, y) in layers {
        overlay_into(&mut pixels, layer.as_rgba(), x, y);
    }
    base.derive(pixels)
}

fn overlay_into(base: &mut RgbaImage, top: &RgbaImage, x: i64, y: i64) {
    let (base_w, base_h) = (base.width() as i64, base.height() as i64);
    for (dx, dy, pixel) in top.enumerate_pixels() {
        let (tx, ty) = (x + dx as i64, y + dy as i64);
        if tx < 0 || ty < 0 || tx >= base_w || ty >= base_h {
            continue;
        }
        blend_over(base.get_pixel_mut(tx as u32, ty as u32), *pixel);
    }
}

/// Blend `src` over `dst` in place.
pub(crate) fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let src_a = src[3] as u32;
    if src_a == 0 {
        return;
    }
    if src_a == 255 {
        *dst = src;
        return;
    }
    let dst_a = dst[3] as u32;
    // Both terms carry an extra factor of 255
    let out_a = src_a * 255 + dst_a * (255 - src_a);
    for c in 0..3 {
        let numerator = src[c] as u32 * src_a * 255 + dst[c] as u32 * dst_a * (255 - src_a);
        dst[c] = ((numerator + out_a / 2) / out_a) as u8;
    }
    dst[3] = ((out_a + 127) / 255) as u8;
}

/// A `diameter × diameter` disc of `color` on transparency.
pub fn filled_circle(diameter: u32, color: Rgba<u8>) -> PixelBuffer {
    let square = PixelBuffer::solid(diameter.max(1), diameter.max(1), color);
    // A square buffer always satisfies the mask's precondition
    circular_mask(&square).unwrap_or(square)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    #[test]
    fn overlay_lands_at_offset() {
        let base = PixelBuffer::solid(10, 10, RED);
        let patch = PixelBuffer::solid(2, 2, BLUE);
        let out = composite(&base, &patch, 3, 4);
        assert_eq!(out.pixel(3, 4), BLUE);
        assert_eq!(out.pixel(4, 5), BLUE);
        assert_eq!(out.pixel(2, 4), RED);
        assert_eq!(out.pixel(5, 4), RED);
        // Base untouched
        assert_eq!(base.pixel(3, 4), RED);
    }

    #[test]
    fn transparent_pixels_leave_base_alone() {
        let base = PixelBuffer::solid(4, 4, RED);
        let out = composite(&base, &PixelBuffer::transparent(4, 4), 0, 0);
        assert_eq!(out, base);
    }

    #[test]
    fn half_transparent_pixels_blend() {
        let base = PixelBuffer::solid(1, 1, Rgba([0, 0, 0, 255]));
        let veil = PixelBuffer::solid(1, 1, Rgba([255, 255, 255, 128]));
        let p = composite(&base, &veil, 0, 0).pixel(0, 0);
        assert_eq!(p, Rgba([128, 128, 128, 255]));
    }

    #[test]
    fn out_of_bounds_is_clipped() {
        let base = PixelBuffer::solid(4, 4, RED);
        let patch = PixelBuffer::solid(4, 4, BLUE);
        let out = composite(&base, &patch, -2, 2);
        assert_eq!(out.dimensions(), (4, 4));
        assert_eq!(out.pixel(0, 3), BLUE);
        assert_eq!(out.pixel(2, 3), RED);
        assert_eq!(out.pixel(0, 1), RED);
        assert_eq!(composite(&base, &patch, 100, -100), base);
    }

    #[test]
    fn later_layers_paint_over_earlier() {
        let base = PixelBuffer::transparent(3, 3);
        let red = PixelBuffer::solid(3, 3, RED);
        let blue = PixelBuffer::solid(1, 1, BLUE);
        let out = composite_all(&base, [(&red, 0, 0), (&blue, 1, 1)]);
        assert_eq!(out.pixel(1, 1), BLUE);
        assert_eq!(out.pixel(0, 0), RED);
    }

    #[test]
    fn blending_onto_transparency_keeps_source_color() {
        let mut dst = Rgba([0, 0, 0, 0]);
        blend_over(&mut dst, Rgba([200, 100, 50, 128]));
        assert_eq!(dst, Rgba([200, 100, 50, 128]));
    }

    #[test]
    fn circle_is_opaque_in_the_middle_only() {
        let disc = filled_circle(40, BLUE);
        assert_eq!(disc.dimensions(), (40, 40));
        assert_eq!(disc.pixel(20, 20), BLUE);
        assert_eq!(disc.pixel(0, 0)[3], 0);
    }
}
