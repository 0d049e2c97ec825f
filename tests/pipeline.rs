//! End-to-end scenarios through the public API, against an in-memory source.

use chrono::{Local, TimeZone};
use image::{Rgba, RgbaImage};
use imagebot::card::{CardLayout, ELLIPSIS, MessageMeta, ReplyCardRenderer, card_text, plan_body};
use imagebot::imaging::{
    Fit, ImagePipeline, ImagingError, MemorySource, OutputFormat, PixelBuffer, Quality, codec,
    geometry, text,
};

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

fn halves(width: u32, height: u32) -> PixelBuffer {
    PixelBuffer::new(RgbaImage::from_fn(width, height, |x, _| {
        if x < width / 2 { RED } else { BLUE }
    }))
}

fn encoded(buffer: &PixelBuffer, format: OutputFormat) -> Vec<u8> {
    codec::encode(buffer, format, Quality::new(90)).unwrap()
}

// =========================================================================
// Geometry
// =========================================================================

#[test]
fn cover_resize_center_crops_the_longer_axis() {
    let out = geometry::resize(&halves(400, 200), 100, 100, Fit::Cover).unwrap();
    assert_eq!(out.dimensions(), (100, 100));
    // Middle 200 columns of the source survive: half red, half blue
    let (left, right) = (out.pixel(5, 50), out.pixel(95, 50));
    assert!(left[0] > 250 && left[2] < 5, "left {left:?}");
    assert!(right[2] > 250 && right[0] < 5, "right {right:?}");
}

#[test]
fn circular_mask_keeps_center_and_clears_corners() {
    let masked = geometry::circular_mask(&PixelBuffer::solid(41, 41, RED)).unwrap();
    assert_eq!(masked.pixel(20, 20)[3], 255);
    assert_eq!(masked.pixel(0, 0)[3], 0);
    assert_eq!(masked.pixel(40, 40)[3], 0);
}

#[test]
fn png_round_trip_is_lossless() {
    let original = halves(30, 12);
    let decoded = codec::decode(&encoded(&original, OutputFormat::Png)).unwrap();
    assert_eq!(decoded, original);
}

// =========================================================================
// Pipeline
// =========================================================================

#[tokio::test]
async fn unknown_filter_yields_none() {
    let source = MemorySource::new().with("mem://a", encoded(&halves(20, 20), OutputFormat::Png));
    let pipeline = ImagePipeline::new(source);
    assert!(pipeline.apply_filter("mem://a", "unknown").await.is_none());
}

#[tokio::test]
async fn image_info_on_jpeg() {
    let jpeg = encoded(&PixelBuffer::solid(640, 480, RED), OutputFormat::Jpeg);
    let size = jpeg.len();
    let pipeline = ImagePipeline::new(MemorySource::new().with("mem://photo.jpg", jpeg));

    let info = pipeline.image_info("mem://photo.jpg").await.unwrap();
    assert_eq!(info.width, 640);
    assert_eq!(info.height, 480);
    assert_eq!(info.format, "jpeg");
    assert_eq!(info.channels, 3);
    assert_eq!(info.size, size);
}

#[tokio::test]
async fn error_kinds_are_available_to_callers() {
    let pipeline = ImagePipeline::new(MemorySource::new());
    let err = pipeline.try_image_info("mem://gone").await.unwrap_err();
    assert!(matches!(err, ImagingError::Fetch(_)));
    assert_eq!(err.kind(), "fetch");
}

#[tokio::test]
async fn thumbnail_then_info_agree() {
    let source = MemorySource::new().with("mem://wide", encoded(&halves(800, 300), OutputFormat::Png));
    let pipeline = ImagePipeline::new(source);
    let thumb = pipeline.thumbnail("mem://wide", 200, 200).await.unwrap();
    let info = codec::metadata(&thumb).unwrap();
    assert_eq!((info.width, info.height), (200, 200));
    assert_eq!(info.format, "jpeg");
}

// =========================================================================
// Reply card
// =========================================================================

#[test]
fn wrapping_empty_text_yields_one_line() {
    let lines = text::wrap("", 223, text::FontMetric::BODY);
    assert_eq!(lines, vec![String::new()]);
    assert_eq!(text::measure(&lines[0], text::FontMetric::BODY), 0);
}

#[tokio::test]
async fn long_message_renders_max_lines_plus_ellipsis() {
    let layout = CardLayout::default();
    // ~12 glyphs per 223px line at the body metric
    let body: String = "abcdefghij ".repeat(28).chars().take(300).collect();
    assert_eq!(body.chars().count(), 300);

    let plan = plan_body(&layout, &body);
    assert_eq!(plan.lines.len(), layout.max_lines());
    assert!(plan.ellipsis);

    let meta = MessageMeta {
        display_name: "someone".into(),
        avatar_url: None,
        body,
        sent_at: Local.with_ymd_and_hms(2024, 6, 1, 18, 30, 0).unwrap(),
    };
    let blocks = card_text(&layout, &meta);
    let body_blocks: Vec<_> = blocks.iter().skip(2).collect();
    assert_eq!(body_blocks.len(), layout.max_lines() + 1);
    assert_eq!(body_blocks.last().unwrap().text, ELLIPSIS);

    let renderer = ReplyCardRenderer::new(MemorySource::new(), layout);
    let png = renderer.render(&meta).await.unwrap();
    let info = codec::metadata(&png).unwrap();
    assert_eq!((info.width, info.height, info.format.as_str()), (315, 460, "png"));
}
