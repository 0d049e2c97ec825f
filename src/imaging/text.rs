//! Text measurement, word wrapping and glyph rendering.
//!
//! Glyphs come from the `font8x8` bitmap tables and are scaled up with
//! nearest-neighbour replication, so measurement is exact integer math and
//! depends only on the character count and the [`FontMetric`].
//!
//! A run of `n` glyphs measures `n × advance − tracking`, where
//! `advance = 8 × scale + tracking`. Empty text measures 0.

use super::buffer::PixelBuffer;
use super::compose::blend_over;
use font8x8::{BASIC_FONTS, BOX_FONTS, GREEK_FONTS, LATIN_FONTS, UnicodeFonts};
use image::{Rgba, RgbaImage};

/// Glyph cell edge in font units.
const CELL: u32 = 8;

/// A bitmap font size: cell scale plus inter-glyph tracking in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontMetric {
    pub scale: u32,
    pub tracking: u32,
}

impl FontMetric {
    /// Reply-card display name (32px).
    pub const USERNAME: FontMetric = FontMetric::scaled(4);
    /// Reply-card time label (16px).
    pub const TIMESTAMP: FontMetric = FontMetric::scaled(2);
    /// Reply-card message body (16px).
    pub const BODY: FontMetric = FontMetric::scaled(2);
    /// Default size for the text-overlay operation (32px).
    pub const OVERLAY: FontMetric = FontMetric::scaled(4);

    /// Metric with tracking equal to one scaled font unit.
    pub const fn scaled(scale: u32) -> Self {
        Self {
            scale,
            tracking: scale,
        }
    }

    pub fn glyph_width(self) -> u32 {
        CELL * self.scale.max(1)
    }

    pub fn line_height(self) -> u32 {
        CELL * self.scale.max(1)
    }

    pub fn advance(self) -> u32 {
        self.glyph_width() + self.tracking
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HorizontalAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerticalAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// A single line of text anchored at `origin`.
///
/// Alignment says which point of the text's bounding box sits on the
/// origin: `Left`/`Top` puts the top-left corner there.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub text: String,
    pub metric: FontMetric,
    pub origin: (i64, i64),
    pub horizontal: HorizontalAlign,
    pub vertical: VerticalAlign,
    pub color: Rgba<u8>,
}

impl TextBlock {
    /// Top-left anchored text.
    pub fn new(text: impl Into<String>, metric: FontMetric, origin: (i64, i64), color: Rgba<u8>) -> Self {
        Self {
            text: text.into(),
            metric,
            origin,
            horizontal: HorizontalAlign::Left,
            vertical: VerticalAlign::Top,
            color,
        }
    }

    pub fn aligned(mut self, horizontal: HorizontalAlign, vertical: VerticalAlign) -> Self {
        self.horizontal = horizontal;
        self.vertical = vertical;
        self
    }

    /// Top-left corner of the rendered text box.
    pub fn top_left(&self) -> (i64, i64) {
        let width = measure(&self.text, self.metric) as i64;
        let height = self.metric.line_height() as i64;
        let x = match self.horizontal {
            HorizontalAlign::Left => self.origin.0,
            HorizontalAlign::Center => self.origin.0 - width / 2,
            HorizontalAlign::Right => self.origin.0 - width,
        };
        let y = match self.vertical {
            VerticalAlign::Top => self.origin.1,
            VerticalAlign::Middle => self.origin.1 - height / 2,
            VerticalAlign::Bottom => self.origin.1 - height,
        };
        (x, y)
    }
}

/// Width in pixels of `text` set in `metric`.
pub fn measure(text: &str, metric: FontMetric) -> u32 {
    let glyphs = text.chars().count() as u32;
    if glyphs == 0 {
        return 0;
    }
    glyphs * metric.advance() - metric.tracking
}

/// Greedy word wrap.
///
/// Words are separated by any whitespace, so line breaks in the input are
/// folded into the flow like spaces. A word joins the current line
/// only if the joined line measures strictly less than `max_width`; a word
/// wider than `max_width` gets a line to itself and is never split. Empty or
/// all-whitespace input yields a single empty line.
pub fn wrap(text: &str, max_width: u32, metric: FontMetric) -> Vec<String> {
    let mut words = text.split_whitespace();
    let Some(first) = words.next() else {
        return vec![String::new()];
    };

    let mut lines = Vec::new();
    let mut current = first.to_string();
    for word in words {
        // The space and the word's first glyph each add one advance, which
        // brings back the tracking `measure` drops from the end of `current`.
        let candidate_width =
            measure(&current, metric) + metric.advance() + measure(word, metric) + metric.tracking;
        if candidate_width < max_width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    lines.push(current);
    lines
}

/// Draw `block` onto a copy of `buffer`. Text outside the canvas is clipped.
pub fn render(buffer: &PixelBuffer, block: &TextBlock) -> PixelBuffer {
    let mut pixels = buffer.as_rgba().clone();
    draw_text(&mut pixels, block);
    buffer.derive(pixels)
}

/// Draw `block` in place. Used by compositing code that already owns a canvas.
pub(crate) fn draw_text(canvas: &mut RgbaImage, block: &TextBlock) {
    if block.text.is_empty() || block.color[3] == 0 {
        return;
    }
    let (mut pen_x, top) = block.top_left();
    let scale = block.metric.scale.max(1) as i64;
    let (width, height) = (canvas.width() as i64, canvas.height() as i64);

    for ch in block.text.chars() {
        let glyph = glyph_for(ch);
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..CELL as i64 {
                if (bits >> col) & 1 == 0 {
                    continue;
                }
                let base_x = pen_x + col * scale;
                let base_y = top + row as i64 * scale;
                for dy in 0..scale {
                    for dx in 0..scale {
                        let (x, y) = (base_x + dx, base_y + dy);
                        if x < 0 || y < 0 || x >= width || y >= height {
                            continue;
                        }
                        blend_over(canvas.get_pixel_mut(x as u32, y as u32), block.color);
                    }
                }
            }
        }
        pen_x += block.metric.advance() as i64;
    }
}

/// Look up a glyph bitmap; each byte is a row, bit 0 the leftmost pixel.
fn glyph_for(ch: char) -> [u8; 8] {
    let ch = match ch {
        '\u{2012}'..='\u{2015}' | '\u{2212}' => '-',
        '\u{2018}' | '\u{2019}' => '\'',
        '\u{201C}' | '\u{201D}' => '"',
        '\u{2026}' => '.',
        other => other,
    };
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| GREEK_FONTS.get(ch))
        .or_else(|| BOX_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}
