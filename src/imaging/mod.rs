//! Image processing in pure Rust, decoded entirely in memory.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** (JPEG, PNG, WebP, GIF) | `image` crate, first frame only |
//! | **Density** | custom parser (JPEG JFIF APP0, PNG pHYs) |
//! | **Resize** | Lanczos3 under a [`Fit`] policy |
//! | **Filters** | Rec. 709 grayscale, HSV modulate, `blur`, `unsharpen` |
//! | **Text** | `font8x8` bitmap glyphs, integer scaled |
//! | **Encode** | JPEG (quality), PNG (lossless), WebP (lossless + quantize) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Closed enums describing image operations
//! - **Codec / Geometry / Filters / Text / Compose**: `&PixelBuffer` in,
//!   new [`PixelBuffer`] out
//! - **Source**: [`ByteSource`] trait, the seam to the network
//! - **Operations**: [`ImagePipeline`], combining all of the above

mod buffer;
mod calculations;
pub mod codec;
pub mod compose;
pub(crate) mod density;
mod error;
pub mod filters;
pub mod geometry;
pub mod operations;
mod params;
pub mod source;
pub mod text;

pub use buffer::{ImageInfo, PixelBuffer};
pub use error::{ImagingError, Result};
pub use operations::{ImagePipeline, PipelineSettings};
pub use params::{FilterKind, Fit, OutputFormat, Quality, Sharpening, parse_hex_color};
pub use source::{ByteSource, MemorySource};
pub use text::{FontMetric, HorizontalAlign, TextBlock, VerticalAlign};
