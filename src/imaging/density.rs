//! Header-only DPI extraction for JPEG and PNG.
//!
//! - JPEG: JFIF APP0 segment (`FF E0`, identifier `JFIF\0`), units byte +
//!   horizontal density.
//! - PNG: `pHYs` chunk, pixels per unit + unit specifier (1 = metre).
//!
//! Only the horizontal density is reported. Anything malformed, missing or
//! unit-less yields `None`; nothing here fails.

use image::ImageFormat;

/// Read the horizontal density in DPI from an encoded image's headers.
pub fn read_density(data: &[u8], format: ImageFormat) -> Option<u32> {
    match format {
        ImageFormat::Jpeg => read_jfif_density(data),
        ImageFormat::Png => read_png_density(data),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// JPEG: JFIF APP0
// ---------------------------------------------------------------------------

const JFIF_IDENTIFIER: &[u8] = b"JFIF\0";

/// JFIF APP0 layout after the 2-byte length:
///   0..5   "JFIF\0"
///   5..7   version
///   7      units (0 = aspect only, 1 = dots/inch, 2 = dots/cm)
///   8..10  X density (big-endian u16)
///   10..12 Y density
fn read_jfif_density(data: &[u8]) -> Option<u32> {
    let segment = find_jpeg_app0(data)?;
    if segment.len() < 12 || !segment.starts_with(JFIF_IDENTIFIER) {
        return None;
    }
    let units = segment[7];
    let x_density = u16::from_be_bytes([segment[8], segment[9]]) as f64;
    if x_density == 0.0 {
        return None;
    }
    match units {
        1 => Some(x_density as u32),
        2 => Some((x_density * 2.54).round() as u32),
        _ => None,
    }
}

/// Find the payload of the first APP0 segment carrying a JFIF header.
fn find_jpeg_app0(data: &[u8]) -> Option<&[u8]> {
    let mut pos = 0;
    while pos + 4 < data.len() {
        if data[pos] == 0xFF && data[pos + 1] == 0xE0 {
            let seg_len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
            let seg_start = pos + 4;
            let seg_end = (pos + 2 + seg_len).min(data.len());
            if seg_end > seg_start && data[seg_start..seg_end].starts_with(JFIF_IDENTIFIER) {
                return Some(&data[seg_start..seg_end]);
            }
        }

        if data[pos] == 0xFF && pos + 3 < data.len() && data[pos + 1] != 0x00 {
            let marker = data[pos + 1];
            // SOS: entropy-coded data follows, no more headers
            if marker == 0xDA {
                break;
            }
            if marker == 0xD8 || marker == 0xD9 || (0xD0..=0xD7).contains(&marker) {
                pos += 2;
            } else {
                let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
                pos += 2 + len;
            }
        } else {
            pos += 1;
        }
    }
    None
}

// ---------------------------------------------------------------------------
// PNG: pHYs chunk
// ---------------------------------------------------------------------------

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const METRES_PER_INCH: f64 = 0.0254;

/// Walk PNG chunks (length u32, type [4], data, crc u32) up to the first
/// `IDAT`; `pHYs` must precede image data.
fn read_png_density(data: &[u8]) -> Option<u32> {
    if !data.starts_with(PNG_SIGNATURE) {
        return None;
    }
    let mut pos = PNG_SIGNATURE.len();
    while pos + 8 <= data.len() {
        let length =
            u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]) as usize;
        let chunk_type = &data[pos + 4..pos + 8];
        let body_start = pos + 8;
        let body_end = body_start.checked_add(length)?;
        if body_end > data.len() {
            return None;
        }

        match chunk_type {
            b"pHYs" if length >= 9 => {
                let body = &data[body_start..body_end];
                let ppu = u32::from_be_bytes([body[0], body[1], body[2], body[3]]) as f64;
                let unit = body[8];
                if unit != 1 || ppu == 0.0 {
                    return None;
                }
                return Some((ppu * METRES_PER_INCH).round() as u32);
            }
            b"IDAT" | b"IEND" => return None,
            _ => {}
        }

        // Skip data + CRC
        pos = body_end + 4;
    }
    None
}
