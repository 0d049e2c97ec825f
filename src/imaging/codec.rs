//! Decode, encode and inspect encoded images.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Sniff format | `image::ImageReader::with_guessed_format` (magic bytes) |
//! | Decode (JPEG, PNG, WebP, GIF first frame) | `image` crate pure-Rust decoders |
//! | Header-only metadata | `ImageReader::into_decoder` + [`density`](super::density) |
//! | Encode → JPEG | `JpegEncoder::new_with_quality`, alpha flattened onto white |
//! | Encode → PNG | `PngEncoder`, RGBA, lossless |
//! | Encode → WebP | `WebPEncoder::new_lossless` after quality-driven quantization |

use super::buffer::{ImageInfo, PixelBuffer};
use super::density::read_density;
use super::error::{ImagingError, Result};
use super::params::{OutputFormat, Quality};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageDecoder, ImageEncoder, ImageFormat, ImageReader, Rgba};
use std::io::Cursor;

/// Containers this crate will decode.
const DECODABLE: &[(ImageFormat, &str)] = &[
    (ImageFormat::Jpeg, "jpeg"),
    (ImageFormat::Png, "png"),
    (ImageFormat::WebP, "webp"),
    (ImageFormat::Gif, "gif"),
];

/// Background JPEG output is flattened onto.
pub const FLATTEN_BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

fn format_tag(format: ImageFormat) -> Option<&'static str> {
    DECODABLE
        .iter()
        .find(|(f, _)| *f == format)
        .map(|(_, tag)| *tag)
}

/// Sniff the container from magic bytes, rejecting anything we don't decode.
fn sniff(data: &[u8]) -> Result<(ImageReader<Cursor<&[u8]>>, ImageFormat)> {
    if data.is_empty() {
        return Err(ImagingError::Decode("input image is empty".into()));
    }
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ImagingError::Decode(e.to_string()))?;
    let format = reader
        .format()
        .ok_or_else(|| ImagingError::Decode("unrecognized image format".into()))?;
    if format_tag(format).is_none() {
        return Err(ImagingError::Decode(format!(
            "unsupported image format: {format:?}"
        )));
    }
    Ok((reader, format))
}

/// Decode raw bytes into an RGBA buffer. GIFs yield their first frame.
pub fn decode(data: &[u8]) -> Result<PixelBuffer> {
    let (reader, format) = sniff(data)?;
    let image = reader
        .decode()
        .map_err(|e| ImagingError::Decode(format!("{format:?}: {e}")))?;
    log::debug!(
        "decoded {:?} {}x{} ({} bytes)",
        format,
        image.width(),
        image.height(),
        data.len()
    );
    Ok(PixelBuffer::new(image.to_rgba8()).with_density(read_density(data, format)))
}

/// Inspect headers without decoding pixel data.
pub fn metadata(data: &[u8]) -> Result<ImageInfo> {
    let (reader, format) = sniff(data)?;
    let decoder = reader
        .into_decoder()
        .map_err(|e| ImagingError::Decode(format!("{format:?}: {e}")))?;
    let (width, height) = decoder.dimensions();
    let channels = decoder.color_type().channel_count();
    Ok(ImageInfo {
        width,
        height,
        format: format_tag(format).unwrap_or_default().to_string(),
        size: data.len(),
        channels,
        density: read_density(data, format),
    })
}

/// Encode a buffer. `quality` only affects JPEG and WebP.
pub fn encode(buffer: &PixelBuffer, format: OutputFormat, quality: Quality) -> Result<Vec<u8>> {
    let (width, height) = buffer.dimensions();
    if width == 0 || height == 0 {
        return Err(ImagingError::Encode(format!(
            "cannot encode an empty {width}x{height} image"
        )));
    }

    let mut out = Vec::new();
    match format {
        OutputFormat::Jpeg => {
            let rgb = flatten(buffer, FLATTEN_BACKGROUND);
            JpegEncoder::new_with_quality(&mut out, quality.as_u8())
                .encode(&rgb, width, height, ExtendedColorType::Rgb8)
                .map_err(|e| ImagingError::Encode(format!("JPEG: {e}")))?;
        }
        OutputFormat::Png => {
            PngEncoder::new(&mut out)
                .write_image(buffer.as_rgba().as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(|e| ImagingError::Encode(format!("PNG: {e}")))?;
        }
        OutputFormat::WebP => {
            // The pure-Rust WebP encoder is lossless only; quality < 100 is
            // honoured by coarsening the color channels first.
            let mut rgba = buffer.as_rgba().clone();
            quantize_rgb(rgba.as_mut(), quality.as_u8());
            WebPEncoder::new_lossless(&mut out)
                .encode(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(|e| ImagingError::Encode(format!("WebP: {e}")))?;
        }
    }
    log::debug!("encoded {format} {width}x{height} ({} bytes)", out.len());
    Ok(out)
}

/// Composite RGBA over an opaque background, returning packed RGB8.
fn flatten(buffer: &PixelBuffer, background: Rgba<u8>) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(buffer.width() as usize * buffer.height() as usize * 3);
    for pixel in buffer.as_rgba().pixels() {
        let alpha = pixel[3] as u32;
        for c in 0..3 {
            let fg = pixel[c] as u32 * alpha;
            let bg = background[c] as u32 * (255 - alpha);
            rgb.push(((fg + bg + 127) / 255) as u8);
        }
    }
    rgb
}

fn quantize_rgb(data: &mut [u8], quality: u8) {
    if quality >= 100 {
        return;
    }
    let levels = levels_for_quality(quality);
    let step = 255.0 / (levels as f32 - 1.0);
    for pixel in data.chunks_exact_mut(4) {
        for channel in pixel.iter_mut().take(3) {
            let bucket = (f32::from(*channel) / step).round();
            *channel = (bucket * step).round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Finer palettes at high quality, aggressively coarse at low quality.
fn levels_for_quality(quality: u8) -> u16 {
    let normalized = (quality as f32).clamp(1.0, 100.0) / 100.0;
    let levels = 2.0 + normalized * normalized * 254.0;
    levels.round().clamp(2.0, 256.0) as u16
}
