//! CLI output formatting for every command.
//!
//! # Output Format
//!
//! ## Info
//!
//! ```text
//! Image Information
//!     Source: https://cdn.example.com/cat.jpg
//!     Width: 640px
//!     Height: 480px
//!     Format: JPEG
//!     Size: 41.27 KB
//!     Channels: 3
//!     Density: 72 DPI
//! ```
//!
//! ## Saved result
//!
//! ```text
//! Image processed successfully!
//!     Saved: out/thumbnail_200x200.jpg (9.81 KB)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions do no I/O.

use crate::imaging::ImageInfo;
use std::path::Path;

/// Shown when an operation degrades to no result.
pub const FAILURE_MESSAGE: &str =
    "Failed to process the image. Please check the URL and try again.";

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Byte count as kilobytes with two decimals.
pub fn format_size_kb(bytes: usize) -> String {
    format!("{:.2} KB", bytes as f64 / 1024.0)
}

pub fn format_info(info: &ImageInfo, source: &str) -> Vec<String> {
    let density = match info.density {
        Some(dpi) => format!("{dpi} DPI"),
        None => "N/A".to_string(),
    };
    vec![
        "Image Information".to_string(),
        format!("{}Source: {source}", indent(1)),
        format!("{}Width: {}px", indent(1), info.width),
        format!("{}Height: {}px", indent(1), info.height),
        format!("{}Format: {}", indent(1), info.format.to_uppercase()),
        format!("{}Size: {}", indent(1), format_size_kb(info.size)),
        format!("{}Channels: {}", indent(1), info.channels),
        format!("{}Density: {density}", indent(1)),
    ]
}

pub fn print_info(info: &ImageInfo, source: &str) {
    for line in format_info(info, source) {
        println!("{line}");
    }
}

/// Info as pretty JSON, for scripting.
pub fn format_info_json(info: &ImageInfo) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(info)
}

pub fn format_saved(path: &Path, bytes: usize) -> Vec<String> {
    vec![
        "Image processed successfully!".to_string(),
        format!(
            "{}Saved: {} ({})",
            indent(1),
            path.display(),
            format_size_kb(bytes)
        ),
    ]
}

pub fn print_saved(path: &Path, bytes: usize) {
    for line in format_saved(path, bytes) {
        println!("{line}");
    }
}
