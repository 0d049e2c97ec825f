//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::Fit;

/// Where a scaled source lands relative to the output canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitPlan {
    /// Region of the source that is kept (cover crops, others keep everything).
    pub crop: (u32, u32, u32, u32),
    /// Size the kept region is resampled to.
    pub scaled: (u32, u32),
    /// Size of the output buffer.
    pub output: (u32, u32),
    /// Offset of the scaled image inside the output (letterboxing).
    pub offset: (i64, i64),
}

/// Calculate the centered source region that has the target's aspect ratio.
///
/// Cropping this region and scaling it to `target` is a cover resize that
/// never materializes the oversized intermediate image.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `target` - Target area dimensions (width, height)
///
/// # Returns
/// * `(x, y, width, height)` - Crop rectangle in source pixels
pub fn calculate_cover_crop(source: (u32, u32), target: (u32, u32)) -> (u32, u32, u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: keep full height, trim the sides
        let w = ((src_h as f64 * tgt_aspect).round() as u32).clamp(1, src_w);
        ((src_w - w) / 2, 0, w, src_h)
    } else {
        // Source is taller: keep full width, trim top and bottom
        let h = ((src_w as f64 / tgt_aspect).round() as u32).clamp(1, src_h);
        (0, (src_h - h) / 2, src_w, h)
    }
}

/// Calculate the largest aspect-preserving size that fits inside the target.
///
/// One dimension matches the target exactly, the other is ≤ target.
pub fn calculate_contain_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let scale = uniform_scale(source, target, f64::min);
    scale_within(source, scale, target)
}

/// Uniform scale factor chosen per axis by `pick` (min = contain, max = cover).
fn uniform_scale(source: (u32, u32), target: (u32, u32), pick: fn(f64, f64) -> f64) -> f64 {
    let sx = target.0 as f64 / source.0 as f64;
    let sy = target.1 as f64 / source.1 as f64;
    pick(sx, sy)
}

/// Apply `scale` to `source`, rounding, and clamp each side to `1..=bound`.
fn scale_within(source: (u32, u32), scale: f64, bound: (u32, u32)) -> (u32, u32) {
    let w = (source.0 as f64 * scale).round() as u32;
    let h = (source.1 as f64 * scale).round() as u32;
    (w.clamp(1, bound.0.max(1)), h.clamp(1, bound.1.max(1)))
}

/// Plan a resize under `fit`. Both `source` and `target` must be non-zero.
pub fn plan_fit(source: (u32, u32), target: (u32, u32), fit: Fit) -> FitPlan {
    let whole = (0, 0, source.0, source.1);
    match fit {
        Fit::Fill => FitPlan {
            crop: whole,
            scaled: target,
            output: target,
            offset: (0, 0),
        },
        Fit::Cover => FitPlan {
            crop: calculate_cover_crop(source, target),
            scaled: target,
            output: target,
            offset: (0, 0),
        },
        Fit::Contain => {
            let scaled = calculate_contain_dimensions(source, target);
            FitPlan {
                crop: whole,
                scaled,
                output: target,
                offset: centered(scaled, target),
            }
        }
        Fit::Inside => {
            let scale = uniform_scale(source, target, f64::min).min(1.0);
            let bound = (target.0.min(source.0), target.1.min(source.1));
            let scaled = scale_within(source, scale, bound);
            FitPlan {
                crop: whole,
                scaled,
                output: scaled,
                offset: (0, 0),
            }
        }
        Fit::Outside => {
            let scale = uniform_scale(source, target, f64::max).max(1.0);
            let w = ((source.0 as f64 * scale).round() as u32).max(target.0).max(source.0);
            let h = ((source.1 as f64 * scale).round() as u32).max(target.1).max(source.1);
            FitPlan {
                crop: whole,
                scaled: (w, h),
                output: (w, h),
                offset: (0, 0),
            }
        }
    }
}

/// Offset that centers `inner` within `outer`.
fn centered(inner: (u32, u32), outer: (u32, u32)) -> (i64, i64) {
    (
        (outer.0 as i64 - inner.0 as i64) / 2,
        (outer.1 as i64 - inner.1 as i64) / 2,
    )
}

/// Top-left corner of grid cell `index` in a row-major `cols`-wide grid.
pub fn grid_cell_origin(index: usize, cols: u32, cell: (u32, u32)) -> (i64, i64) {
    let cols = cols.max(1) as usize;
    let col = (index % cols) as i64;
    let row = (index / cols) as i64;
    (col * cell.0 as i64, row * cell.1 as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // =========================================================================
    // calculate_cover_crop tests
    // =========================================================================

    #[test]
    fn cover_crop_wider_source_to_square() {
        // 400x200 → 1:1 keeps the middle 200x200
        assert_eq!(calculate_cover_crop((400, 200), (100, 100)), (100, 0, 200, 200));
    }

    #[test]
    fn cover_crop_taller_source_to_landscape() {
        // 600x800 → 5:4 keeps full width, 480 rows centered
        assert_eq!(calculate_cover_crop((600, 800), (500, 400)), (0, 160, 600, 480));
    }

    #[test]
    fn cover_crop_same_aspect_keeps_everything() {
        assert_eq!(calculate_cover_crop((800, 600), (400, 300)), (0, 0, 800, 600));
    }

    // =========================================================================
    // calculate_contain_dimensions tests
    // =========================================================================

    #[test]
    fn contain_landscape_into_square() {
        assert_eq!(calculate_contain_dimensions((400, 200), (100, 100)), (100, 50));
    }

    #[test]
    fn contain_portrait_into_landscape() {
        assert_eq!(calculate_contain_dimensions((300, 600), (400, 200)), (100, 200));
    }

    // =========================================================================
    // plan_fit tests
    // =========================================================================

    #[test]
    fn cover_crops_the_longer_axis_centered() {
        let plan = plan_fit((400, 200), (100, 100), Fit::Cover);
        assert_eq!(plan.crop, (100, 0, 200, 200));
        assert_eq!(plan.scaled, (100, 100));
        assert_eq!(plan.output, (100, 100));
    }

    #[test]
    fn contain_letterboxes_centered() {
        let plan = plan_fit((400, 200), (100, 100), Fit::Contain);
        assert_eq!(plan.scaled, (100, 50));
        assert_eq!(plan.output, (100, 100));
        assert_eq!(plan.offset, (0, 25));
    }

    #[test]
    fn inside_never_upscales() {
        let plan = plan_fit((80, 40), (500, 500), Fit::Inside);
        assert_eq!(plan.output, (80, 40));
    }

    #[test]
    fn inside_shrinks_to_fit() {
        let plan = plan_fit((1000, 500), (200, 200), Fit::Inside);
        assert_eq!(plan.output, (200, 100));
    }

    #[test]
    fn outside_never_downscales() {
        let plan = plan_fit((1000, 500), (100, 100), Fit::Outside);
        assert_eq!(plan.output, (1000, 500));
    }

    #[test]
    fn outside_grows_to_cover() {
        let plan = plan_fit((100, 50), (400, 400), Fit::Outside);
        assert_eq!(plan.output, (800, 400));
    }

    #[test]
    fn grid_cells_are_row_major() {
        assert_eq!(grid_cell_origin(0, 2, (300, 300)), (0, 0));
        assert_eq!(grid_cell_origin(1, 2, (300, 300)), (300, 0));
        assert_eq!(grid_cell_origin(2, 2, (300, 300)), (0, 300));
        assert_eq!(grid_cell_origin(5, 3, (10, 20)), (20, 20));
    }

    proptest! {
        #[test]
        fn plan_honours_fit_contract(
            sw in 1u32..3000, sh in 1u32..3000,
            tw in 1u32..3000, th in 1u32..3000,
        ) {
            let fill = plan_fit((sw, sh), (tw, th), Fit::Fill);
            prop_assert_eq!(fill.output, (tw, th));

            let cover = plan_fit((sw, sh), (tw, th), Fit::Cover);
            prop_assert_eq!(cover.output, (tw, th));
            let (cx, cy, cw, ch) = cover.crop;
            prop_assert!(cw >= 1 && ch >= 1);
            prop_assert!(cx + cw <= sw && cy + ch <= sh);

            let contain = plan_fit((sw, sh), (tw, th), Fit::Contain);
            prop_assert_eq!(contain.output, (tw, th));
            prop_assert!(contain.scaled.0 <= tw && contain.scaled.1 <= th);
            prop_assert!(contain.offset.0 >= 0 && contain.offset.1 >= 0);

            let inside = plan_fit((sw, sh), (tw, th), Fit::Inside);
            prop_assert!(inside.output.0 <= tw && inside.output.1 <= th);
            prop_assert!(inside.output.0 <= sw && inside.output.1 <= sh);
            prop_assert!(inside.output.0 >= 1 && inside.output.1 >= 1);

            let outside = plan_fit((sw, sh), (tw, th), Fit::Outside);
            prop_assert!(outside.output.0 >= tw && outside.output.1 >= th);
            prop_assert!(outside.output.0 >= sw && outside.output.1 >= sh);
        }
    }
}
