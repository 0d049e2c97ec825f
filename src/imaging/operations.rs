//! High-level image operations.
//!
//! [`ImagePipeline`] combines a [`ByteSource`] with the codec, geometry,
//! filter and text modules. Every operation runs fetch → decode →
//! transform → encode and comes in two forms:
//!
//! - `try_*` returns `Result<_, ImagingError>` so callers can tell error
//!   kinds apart.
//! - The plain form logs the error and returns `None`; nothing escapes.
//!
//! The plain forms of `apply_filter`, `resize` and `convert` take the
//! option as a string, since that is what arrives from outside. The string
//! is parsed before anything is fetched.

use super::buffer::{ImageInfo, PixelBuffer};
use super::calculations::grid_cell_origin;
use super::codec;
use super::compose;
use super::error::{ImagingError, Result};
use super::filters;
use super::geometry::{self, MAX_OUTPUT_PIXELS};
use super::params::{FilterKind, Fit, OutputFormat, Quality};
use super::source::ByteSource;
use super::text::{self, FontMetric, TextBlock};
use image::Rgba;
use rayon::prelude::*;

/// Tunables shared by all operations.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    /// JPEG quality for thumbnails.
    pub thumbnail_quality: Quality,
    /// JPEG/WebP quality for everything else.
    pub processed_quality: Quality,
    /// Edge length of one square collage cell.
    pub collage_cell: u32,
    pub collage_background: Rgba<u8>,
    pub text_color: Rgba<u8>,
    pub text_metric: FontMetric,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            thumbnail_quality: Quality::new(80),
            processed_quality: Quality::new(90),
            collage_cell: 300,
            collage_background: Rgba([255, 255, 255, 255]),
            text_color: Rgba([0, 0, 0, 255]),
            text_metric: FontMetric::OVERLAY,
        }
    }
}

/// The seven image operations over one byte source.
#[derive(Debug)]
pub struct ImagePipeline<S> {
    source: S,
    settings: PipelineSettings,
}

impl<S: ByteSource> ImagePipeline<S> {
    pub fn new(source: S) -> Self {
        Self::with_settings(source, PipelineSettings::default())
    }

    pub fn with_settings(source: S, settings: PipelineSettings) -> Self {
        Self { source, settings }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    async fn load(&self, url: &str) -> Result<PixelBuffer> {
        let bytes = self.source.fetch(url).await?;
        codec::decode(&bytes)
    }

    // =========================================================================
    // Thumbnail
    // =========================================================================

    /// Center-cropped `width × height` JPEG.
    pub async fn try_thumbnail(&self, url: &str, width: u32, height: u32) -> Result<Vec<u8>> {
        let image = self.load(url).await?;
        let thumb = geometry::resize(&image, width, height, Fit::Cover)?;
        codec::encode(&thumb, OutputFormat::Jpeg, self.settings.thumbnail_quality)
    }

    pub async fn thumbnail(&self, url: &str, width: u32, height: u32) -> Option<Vec<u8>> {
        degrade("thumbnail", url, self.try_thumbnail(url, width, height).await)
    }

    // =========================================================================
    // Filter
    // =========================================================================

    pub async fn try_apply_filter(&self, url: &str, kind: FilterKind) -> Result<Vec<u8>> {
        let image = self.load(url).await?;
        let filtered = filters::apply(&image, kind);
        codec::encode(&filtered, OutputFormat::Jpeg, self.settings.processed_quality)
    }

    pub async fn apply_filter(&self, url: &str, filter: &str) -> Option<Vec<u8>> {
        let result = match filter.parse::<FilterKind>() {
            Ok(kind) => self.try_apply_filter(url, kind).await,
            Err(e) => Err(e),
        };
        degrade("filter", url, result)
    }

    // =========================================================================
    // Resize
    // =========================================================================

    pub async fn try_resize(&self, url: &str, width: u32, height: u32, fit: Fit) -> Result<Vec<u8>> {
        let image = self.load(url).await?;
        let resized = geometry::resize(&image, width, height, fit)?;
        codec::encode(&resized, OutputFormat::Jpeg, self.settings.processed_quality)
    }

    pub async fn resize(&self, url: &str, width: u32, height: u32, fit: &str) -> Option<Vec<u8>> {
        let result = match fit.parse::<Fit>() {
            Ok(fit) => self.try_resize(url, width, height, fit).await,
            Err(e) => Err(e),
        };
        degrade("resize", url, result)
    }

    // =========================================================================
    // Text overlay
    // =========================================================================

    /// Draw `text` with its top-left corner at `(x, y)`.
    pub async fn try_add_text(&self, url: &str, text: &str, x: i64, y: i64) -> Result<Vec<u8>> {
        let image = self.load(url).await?;
        let block = TextBlock::new(text, self.settings.text_metric, (x, y), self.settings.text_color);
        let drawn = text::render(&image, &block);
        codec::encode(&drawn, OutputFormat::Jpeg, self.settings.processed_quality)
    }

    pub async fn add_text(&self, url: &str, text: &str, x: i64, y: i64) -> Option<Vec<u8>> {
        degrade("text overlay", url, self.try_add_text(url, text, x, y).await)
    }

    // =========================================================================
    // Collage
    // =========================================================================

    /// Tile up to `cols × rows` images into a grid, row-major.
    ///
    /// Each tile is stretched to one cell. A tile that fails to fetch or
    /// decode is skipped and its cell keeps the background color; URLs past
    /// the last cell are ignored.
    pub async fn try_collage<U>(&self, urls: &[U], cols: u32, rows: u32) -> Result<Vec<u8>>
    where
        U: AsRef<str> + Sync,
    {
        let cell = self.settings.collage_cell;
        let (width, height) = collage_canvas(cols, rows, cell)?;
        let slots = (cols * rows) as usize;

        let mut fetched = Vec::new();
        for (index, url) in urls.iter().take(slots).enumerate() {
            match self.source.fetch(url.as_ref()).await {
                Ok(bytes) => fetched.push((index, bytes)),
                Err(e) => log::warn!("collage tile {index} skipped: {e}"),
            }
        }

        let tiles: Vec<(usize, PixelBuffer)> = fetched
            .par_iter()
            .filter_map(|(index, bytes)| {
                let tile = codec::decode(bytes)
                    .and_then(|image| geometry::resize(&image, cell, cell, Fit::Fill));
                match tile {
                    Ok(tile) => Some((*index, tile)),
                    Err(e) => {
                        log::warn!("collage tile {index} skipped: {e}");
                        None
                    }
                }
            })
            .collect();
        log::debug!("collage {cols}x{rows}: {} of {slots} cells filled", tiles.len());

        let canvas = PixelBuffer::solid(width, height, self.settings.collage_background);
        let layers = tiles.iter().map(|(index, tile)| {
            let (x, y) = grid_cell_origin(*index, cols, (cell, cell));
            (tile, x, y)
        });
        let collage = compose::composite_all(&canvas, layers);
        codec::encode(&collage, OutputFormat::Jpeg, self.settings.processed_quality)
    }

    pub async fn collage<U>(&self, urls: &[U], cols: u32, rows: u32) -> Option<Vec<u8>>
    where
        U: AsRef<str> + Sync,
    {
        let label = format!("{} urls", urls.len());
        degrade("collage", &label, self.try_collage(urls, cols, rows).await)
    }

    // =========================================================================
    // Convert
    // =========================================================================

    pub async fn try_convert(&self, url: &str, format: OutputFormat) -> Result<Vec<u8>> {
        let image = self.load(url).await?;
        codec::encode(&image, format, self.settings.processed_quality)
    }

    pub async fn convert(&self, url: &str, format: &str) -> Option<Vec<u8>> {
        let result = match format.parse::<OutputFormat>() {
            Ok(format) => self.try_convert(url, format).await,
            Err(e) => Err(e),
        };
        degrade("convert", url, result)
    }

    // =========================================================================
    // Info
    // =========================================================================

    /// Header snapshot of the image behind `url`. Nothing is re-encoded.
    pub async fn try_image_info(&self, url: &str) -> Result<ImageInfo> {
        let bytes = self.source.fetch(url).await?;
        codec::metadata(&bytes)
    }

    pub async fn image_info(&self, url: &str) -> Option<ImageInfo> {
        degrade("info", url, self.try_image_info(url).await)
    }
}

/// Canvas size for a `cols × rows` grid of square cells.
fn collage_canvas(cols: u32, rows: u32, cell: u32) -> Result<(u32, u32)> {
    if cols == 0 || rows == 0 || cell == 0 {
        return Err(ImagingError::InvalidDimension(format!(
            "collage grid {cols}x{rows} of {cell}px cells"
        )));
    }
    let width = cols.checked_mul(cell);
    let height = rows.checked_mul(cell);
    match (width, height) {
        (Some(w), Some(h)) if w as u64 * h as u64 <= MAX_OUTPUT_PIXELS => Ok((w, h)),
        _ => Err(ImagingError::InvalidDimension(format!(
            "collage grid {cols}x{rows} of {cell}px cells is too large"
        ))),
    }
}

fn degrade<T>(operation: &str, subject: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log::error!("{operation} failed for {subject}: {e}");
            None
        }
    }
}
