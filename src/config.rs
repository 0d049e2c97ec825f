//! Bot configuration module.
//!
//! Handles loading, validating, and merging `imagebot.toml`. Configuration
//! is layered: stock defaults are overridden by whatever the user file sets.
//!
//! ## Config File Location
//!
//! `imagebot.toml` in the working directory is picked up automatically;
//! `--config <path>` points somewhere else (and must exist).
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [quality]
//! thumbnail = 80            # JPEG quality for thumbnails (1-100)
//! processed = 90            # JPEG/WebP quality for everything else (1-100)
//!
//! [fetch]
//! timeout_secs = 15
//! max_bytes = 8388608       # Refuse larger downloads
//! user_agent = "imagebot"
//!
//! [thumbnail]
//! width = 200
//! height = 200
//!
//! [collage]
//! cell_size = 300           # Edge of one square cell in pixels
//! background = "#FFFFFF"
//!
//! [text]
//! x = 10
//! y = 10
//! color = "#000000"
//! scale = 4                 # 8px glyph cell × scale
//!
//! [card]
//! template = "assets/concern.png"
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse: override just the values you want:
//!
//! ```toml
//! [collage]
//! background = "#000000"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::fetch::FetchSettings;
use crate::imaging::{FontMetric, PipelineSettings, Quality, parse_hex_color};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// File name looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "imagebot.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Bot configuration loaded from `imagebot.toml`.
///
/// All fields have defaults. User config files need only specify the
/// values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BotConfig {
    pub quality: QualityConfig,
    pub fetch: FetchConfig,
    pub thumbnail: ThumbnailConfig,
    pub collage: CollageConfig,
    pub text: TextConfig,
    pub card: CardConfig,
}

impl BotConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("quality.thumbnail", self.quality.thumbnail),
            ("quality.processed", self.quality.processed),
        ] {
            if !(1..=100).contains(&value) {
                return Err(ConfigError::Validation(format!("{key} must be 1-100")));
            }
        }
        if self.fetch.max_bytes == 0 {
            return Err(ConfigError::Validation(
                "fetch.max_bytes must be positive".into(),
            ));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "fetch.timeout_secs must be positive".into(),
            ));
        }
        if self.thumbnail.width == 0 || self.thumbnail.height == 0 {
            return Err(ConfigError::Validation(
                "thumbnail width and height must be non-zero".into(),
            ));
        }
        if !(50..=1000).contains(&self.collage.cell_size) {
            return Err(ConfigError::Validation(
                "collage.cell_size must be 50-1000".into(),
            ));
        }
        if !(1..=8).contains(&self.text.scale) {
            return Err(ConfigError::Validation("text.scale must be 1-8".into()));
        }
        for (key, value) in [
            ("collage.background", &self.collage.background),
            ("text.color", &self.text.color),
        ] {
            if parse_hex_color(value).is_none() {
                return Err(ConfigError::Validation(format!(
                    "{key} must be #RRGGBB or #RRGGBBAA, got {value:?}"
                )));
            }
        }
        Ok(())
    }

    /// Pipeline tunables derived from this config.
    ///
    /// Colors fall back to white if unparsable; [`validate`](Self::validate)
    /// rejects such configs before they get here.
    pub fn pipeline_settings(&self) -> PipelineSettings {
        let defaults = PipelineSettings::default();
        PipelineSettings {
            thumbnail_quality: Quality::new(self.quality.thumbnail),
            processed_quality: Quality::new(self.quality.processed),
            collage_cell: self.collage.cell_size,
            collage_background: parse_hex_color(&self.collage.background)
                .unwrap_or(defaults.collage_background),
            text_color: parse_hex_color(&self.text.color).unwrap_or(defaults.text_color),
            text_metric: FontMetric::scaled(self.text.scale),
        }
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            timeout: Duration::from_secs(self.fetch.timeout_secs),
            max_bytes: self.fetch.max_bytes,
            user_agent: self.fetch.user_agent.clone(),
        }
    }
}

/// Encoder quality settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QualityConfig {
    /// JPEG quality for thumbnails.
    pub thumbnail: u32,
    /// JPEG/WebP quality for filter, resize, text, collage and convert.
    pub processed: u32,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            thumbnail: 80,
            processed: 90,
        }
    }
}

/// Remote fetch limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    /// Downloads larger than this are refused before decoding.
    pub max_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            max_bytes: 8 * 1024 * 1024,
            user_agent: "imagebot".to_string(),
        }
    }
}

/// Default thumbnail box when the command omits one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            width: 200,
            height: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollageConfig {
    pub cell_size: u32,
    pub background: String,
}

impl Default for CollageConfig {
    fn default() -> Self {
        Self {
            cell_size: 300,
            background: "#FFFFFF".to_string(),
        }
    }
}

/// Text overlay defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextConfig {
    pub x: u32,
    pub y: u32,
    pub color: String,
    /// Integer glyph scale over the 8px bitmap cell.
    pub scale: u32,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            x: 10,
            y: 10,
            color: "#000000".to_string(),
            scale: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CardConfig {
    /// Template image drawn across the top of reply cards.
    /// A missing or unreadable file renders a placeholder instead.
    pub template: PathBuf,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            template: PathBuf::from("assets/concern.png"),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(BotConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(value)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<BotConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BotConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the bot config.
///
/// With an explicit `path` the file must exist. Without one,
/// [`DEFAULT_CONFIG_FILE`] in the working directory is used if present,
/// otherwise the stock defaults.
pub fn load_config(path: Option<&Path>) -> Result<BotConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = match path {
        Some(path) => Some(load_raw_config(path)?),
        None => {
            let fallback = Path::new(DEFAULT_CONFIG_FILE);
            if fallback.exists() {
                Some(load_raw_config(fallback)?)
            } else {
                None
            }
        }
    };
    if let Some(path) = path {
        log::debug!("loaded config from {}", path.display());
    }
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `imagebot.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# imagebot Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Encoder quality
# ---------------------------------------------------------------------------
[quality]
# JPEG quality for thumbnails (1 = worst, 100 = best).
thumbnail = 80

# JPEG/WebP quality for filter, resize, text, collage and convert.
processed = 90

# ---------------------------------------------------------------------------
# Fetching remote images
# ---------------------------------------------------------------------------
[fetch]
timeout_secs = 15

# Larger downloads are refused (8 MiB, the usual attachment limit).
max_bytes = 8388608

user_agent = "imagebot"

# ---------------------------------------------------------------------------
# Thumbnail defaults
# ---------------------------------------------------------------------------
[thumbnail]
width = 200
height = 200

# ---------------------------------------------------------------------------
# Collage grid
# ---------------------------------------------------------------------------
[collage]
# Edge of one square cell in pixels (50-1000).
cell_size = 300

# Color of empty cells and cells whose image failed to load.
background = "#FFFFFF"

# ---------------------------------------------------------------------------
# Text overlay
# ---------------------------------------------------------------------------
[text]
# Default position of the text's top-left corner.
x = 10
y = 10

color = "#000000"

# Glyphs are an 8px bitmap cell scaled by this factor (1-8).
scale = 4

# ---------------------------------------------------------------------------
# Reply card
# ---------------------------------------------------------------------------
[card]
# Template image stretched over the top 315x315 of the card.
# A missing file renders a placeholder square instead.
template = "assets/concern.png"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = BotConfig::default();
        assert_eq!(config.quality.thumbnail, 80);
        assert_eq!(config.quality.processed, 90);
        assert_eq!(config.fetch.max_bytes, 8_388_608);
        assert_eq!(config.collage.cell_size, 300);
        assert_eq!(config.text.scale, 4);
        assert_eq!(config.card.template, PathBuf::from("assets/concern.png"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_partial_config() {
        let toml = r##"
[collage]
background = "#000000"
"##;
        let config: BotConfig = toml::from_str(toml).unwrap();
        // Overridden value
        assert_eq!(config.collage.background, "#000000");
        // Default values preserved
        assert_eq!(config.collage.cell_size, 300);
        assert_eq!(config.quality.processed, 90);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let toml = r##"
[collage]
cell = 300
"##;
        assert!(toml::from_str::<BotConfig>(toml).is_err());
    }

    #[test]
    fn stock_config_toml_matches_defaults() {
        let parsed: BotConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(parsed, BotConfig::default());
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn validate_rejects_out_of_range_quality() {
        let mut config = BotConfig::default();
        config.quality.processed = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
        config.quality.processed = 101;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_bad_colors_and_sizes() {
        let mut config = BotConfig::default();
        config.text.color = "white".into();
        assert!(config.validate().is_err());

        let mut config = BotConfig::default();
        config.collage.cell_size = 10;
        assert!(config.validate().is_err());

        let mut config = BotConfig::default();
        config.text.scale = 9;
        assert!(config.validate().is_err());

        let mut config = BotConfig::default();
        config.fetch.max_bytes = 0;
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // Merging and loading
    // =========================================================================

    #[test]
    fn merge_overrides_nested_keys_only() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str("[text]\nx = 42\n").unwrap();
        let config = resolve_config(base, Some(overlay)).unwrap();
        assert_eq!(config.text.x, 42);
        assert_eq!(config.text.y, 10);
        assert_eq!(config.text.color, "#000000");
    }

    #[test]
    fn load_config_reads_explicit_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bot.toml");
        fs::write(
            &path,
            r##"
[quality]
thumbnail = 60

[fetch]
max_bytes = 1024
"##,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.quality.thumbnail, 60);
        assert_eq!(config.fetch.max_bytes, 1024);
        // Unspecified values should be defaults
        assert_eq!(config.quality.processed, 90);
    }

    #[test]
    fn load_config_missing_explicit_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(Some(&tmp.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_config_rejects_invalid_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bot.toml");
        fs::write(&path, "[quality]\nprocessed = 150\n").unwrap();
        assert!(matches!(
            load_config(Some(&path)),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn load_config_rejects_malformed_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bot.toml");
        fs::write(&path, "[quality\n").unwrap();
        assert!(matches!(load_config(Some(&path)), Err(ConfigError::Toml(_))));
    }

    // =========================================================================
    // Derived settings
    // =========================================================================

    #[test]
    fn pipeline_settings_follow_config() {
        let mut config = BotConfig::default();
        config.quality.thumbnail = 70;
        config.collage.background = "#000000".into();
        config.text.scale = 2;
        let settings = config.pipeline_settings();
        assert_eq!(settings.thumbnail_quality.value(), 70);
        assert_eq!(settings.collage_background, image::Rgba([0, 0, 0, 255]));
        assert_eq!(settings.text_metric, FontMetric::scaled(2));
        assert_eq!(settings.collage_cell, 300);
        assert_eq!(settings.text_color, image::Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn fetch_settings_follow_config() {
        let settings = BotConfig::default().fetch_settings();
        assert_eq!(settings.timeout, Duration::from_secs(15));
        assert_eq!(settings.max_bytes, 8_388_608);
        assert_eq!(settings.user_agent, "imagebot");
    }
}
