//! In-memory raster types.
//!
//! Every transform in this crate takes a `&PixelBuffer` and returns a new
//! one; inputs are never modified. Pixels are always stored as RGBA8 so
//! alpha survives every stage until an encoder that cannot carry it
//! flattens the result.

use image::{Rgba, RgbaImage};
use serde::Serialize;

/// Decoded raster image with optional density metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    pixels: RgbaImage,
    density: Option<u32>,
}

impl PixelBuffer {
    pub const CHANNELS: u8 = 4;

    pub fn new(pixels: RgbaImage) -> Self {
        Self {
            pixels,
            density: None,
        }
    }

    pub fn with_density(mut self, density: Option<u32>) -> Self {
        self.density = density;
        self
    }

    /// A `width × height` buffer filled with one color.
    pub fn solid(width: u32, height: u32, color: Rgba<u8>) -> Self {
        Self::new(RgbaImage::from_pixel(width, height, color))
    }

    /// A fully transparent `width × height` buffer.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self::solid(width, height, Rgba([0, 0, 0, 0]))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn channels(&self) -> u8 {
        Self::CHANNELS
    }

    /// Dots per inch carried over from the source file, if it declared one.
    pub fn density(&self) -> Option<u32> {
        self.density
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.pixels.get_pixel(x, y)
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.pixels
    }

    /// Build a new buffer from this one's pixels, keeping the density.
    pub(crate) fn derive(&self, pixels: RgbaImage) -> Self {
        Self {
            pixels,
            density: self.density,
        }
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(pixels: RgbaImage) -> Self {
        Self::new(pixels)
    }
}

/// Read-only snapshot of an encoded image's properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// Lowercase container tag: `jpeg`, `png`, `webp`, `gif`.
    pub format: String,
    /// Size of the encoded input in bytes.
    pub size: usize,
    /// Channel count of the encoded data (3 for RGB JPEG, 4 for RGBA PNG).
    pub channels: u8,
    /// Dots per inch, when the header declares one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<u32>,
}
