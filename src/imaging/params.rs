//! Parameter types for image operations.
//!
//! These types describe *what* to do, not *how* to do it. Every operation
//! option that reaches the pipeline from outside (a filter name, a fit
//! policy, a target format) is a closed enum here; the `FromStr` impls are
//! the single place where free-form input is rejected.
//!
//! ## Types
//!
//! - [`Quality`] — Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`Sharpening`] — Unsharp-mask parameters (sigma + threshold).
//! - [`Fit`] — How an image's aspect ratio is reconciled with a target box.
//! - [`FilterKind`] — The five parameterless pixel filters.
//! - [`OutputFormat`] — Encodable targets (JPEG, PNG, WebP).

use super::error::ImagingError;
use image::Rgba;
use std::fmt;
use std::str::FromStr;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Quality as the `u8` the encoders take.
    pub fn as_u8(self) -> u8 {
        self.0.clamp(1, 100) as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Sharpening parameters for unsharp mask.
///
/// - `sigma`: Standard deviation of the Gaussian blur (higher = more sharpening)
/// - `threshold`: Minimum brightness difference to sharpen (0 = sharpen all pixels)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpening {
    pub sigma: f32,
    pub threshold: i32,
}

impl Sharpening {
    /// Single-pass sharpening used by the `sharpen` and `vintage` filters.
    pub fn standard() -> Self {
        Self {
            sigma: 1.0,
            threshold: 0,
        }
    }
}

/// Resize fit policy.
///
/// | Policy | Aspect | Output size |
/// |---|---|---|
/// | `Cover` | kept | exactly target, overflow center-cropped |
/// | `Contain` | kept | exactly target, letterboxed with transparency |
/// | `Fill` | ignored | exactly target |
/// | `Inside` | kept | ≤ target and ≤ original |
/// | `Outside` | kept | ≥ target and ≥ original |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fit {
    #[default]
    Cover,
    Contain,
    Fill,
    Inside,
    Outside,
}

impl Fit {
    pub const ALL: [Fit; 5] = [
        Fit::Cover,
        Fit::Contain,
        Fit::Fill,
        Fit::Inside,
        Fit::Outside,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Cover => "cover",
            Self::Contain => "contain",
            Self::Fill => "fill",
            Self::Inside => "inside",
            Self::Outside => "outside",
        }
    }
}

impl FromStr for Fit {
    type Err = ImagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|fit| fit.name() == normalized)
            .ok_or_else(|| ImagingError::UnknownFit(s.to_string()))
    }
}

impl fmt::Display for Fit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The fixed pixel filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Grayscale,
    Sepia,
    Vintage,
    Blur,
    Sharpen,
}

impl FilterKind {
    pub const ALL: [FilterKind; 5] = [
        FilterKind::Grayscale,
        FilterKind::Sepia,
        FilterKind::Vintage,
        FilterKind::Blur,
        FilterKind::Sharpen,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Grayscale => "grayscale",
            Self::Sepia => "sepia",
            Self::Vintage => "vintage",
            Self::Blur => "blur",
            Self::Sharpen => "sharpen",
        }
    }
}

impl FromStr for FilterKind {
    type Err = ImagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| ImagingError::UnknownFilter(s.to_string()))
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Encodable output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
        }
    }

    /// Lowercase tag, as reported in [`ImageInfo::format`](super::ImageInfo).
    pub fn tag(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
        }
    }

    pub fn is_lossy(self) -> bool {
        !matches!(self, Self::Png)
    }
}

impl FromStr for OutputFormat {
    type Err = ImagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::WebP),
            _ => Err(ImagingError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Parse `#RRGGBB` or `#RRGGBBAA` (leading `#` optional).
pub fn parse_hex_color(input: &str) -> Option<Rgba<u8>> {
    let hex = input.trim().trim_start_matches('#');
    if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
    Some(Rgba([channel(0)?, channel(2)?, channel(4)?, alpha]))
}
