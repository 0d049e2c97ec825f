//! Reply card rendering.
//!
//! A reply card quotes one chat message under a fixed meme template:
//!
//! ```text
//! ┌──────────── 315 ────────────┐
//! │                             │
//! │      template (315×315)     │
//! │                             │
//! ├─────────────────────────────┤ y = 315
//! │                             │
//! │ (●)  Name — 09:41           │ y = 355  avatar 40×40 at x = 20
//! │      wrapped body line 1    │ y = 395  content column x = 72, 223 wide
//! │      wrapped body line 2    │ y = 413
//! │      ...                    │ y = 431  only when the body overflows
//! └─────────────────────────────┘ y = 460
//! ```
//!
//! All geometry lives in [`CardLayout`]. Sub-resources degrade instead of
//! failing: a missing template becomes a red square, a missing avatar a
//! blue disc. Only the final PNG encode can fail a render.

use crate::imaging::{
    ByteSource, Fit, FontMetric, OutputFormat, PixelBuffer, Quality, Result, TextBlock, codec,
    compose, geometry, text,
};
use chrono::{DateTime, Local};
use image::Rgba;

/// Body text used when the quoted message has none.
pub const EMPTY_BODY: &str = "*No text content*";
/// Marker drawn on the slot after the last body line when text was cut.
pub const ELLIPSIS: &str = "...";

/// Colors used on the card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardPalette {
    pub name: Rgba<u8>,
    pub timestamp: Rgba<u8>,
    pub body: Rgba<u8>,
    pub template_placeholder: Rgba<u8>,
    pub avatar_placeholder: Rgba<u8>,
}

/// Fixed geometry of the reply card. Positions are in canvas pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct CardLayout {
    pub canvas: (u32, u32),
    pub template: (u32, u32),
    /// Placeholder drawn when the template cannot be used.
    pub template_placeholder: (u32, u32, i64, i64),
    /// Top of the message region; the avatar's top edge.
    pub message_y: i64,
    pub avatar_x: i64,
    pub avatar_size: u32,
    /// Gap between avatar and content column.
    pub content_gap: i64,
    pub right_margin: i64,
    pub name_offset_y: i64,
    pub body_offset_y: i64,
    pub line_height: i64,
    /// Space kept free under the message region when counting body lines.
    pub bottom_reserve: i64,
    /// Gap between the end of the name and the time label.
    pub timestamp_gap: i64,
    pub username_font: FontMetric,
    pub timestamp_font: FontMetric,
    pub body_font: FontMetric,
    pub palette: CardPalette,
}

impl Default for CardLayout {
    fn default() -> Self {
        Self {
            canvas: (315, 460),
            template: (315, 315),
            template_placeholder: (100, 100, 50, 50),
            message_y: 355,
            avatar_x: 20,
            avatar_size: 40,
            content_gap: 12,
            right_margin: 20,
            name_offset_y: 16,
            body_offset_y: 40,
            line_height: 18,
            bottom_reserve: 60,
            timestamp_gap: 8,
            username_font: FontMetric::USERNAME,
            timestamp_font: FontMetric::TIMESTAMP,
            body_font: FontMetric::BODY,
            palette: CardPalette {
                name: Rgba([255, 221, 0, 255]),
                timestamp: Rgba([150, 150, 150, 255]),
                body: Rgba([220, 221, 222, 255]),
                template_placeholder: Rgba([0xFF, 0x6B, 0x6B, 0xFF]),
                avatar_placeholder: Rgba([0x4A, 0x90, 0xE2, 0xFF]),
            },
        }
    }
}

impl CardLayout {
    pub fn avatar_origin(&self) -> (i64, i64) {
        (self.avatar_x, self.message_y)
    }

    /// Left edge of the name/body column.
    pub fn content_x(&self) -> i64 {
        self.avatar_x + self.avatar_size as i64 + self.content_gap
    }

    pub fn content_width(&self) -> u32 {
        (self.canvas.0 as i64 - self.content_x() - self.right_margin).max(0) as u32
    }

    /// How many body lines fit above the bottom reserve.
    pub fn max_lines(&self) -> usize {
        if self.line_height <= 0 {
            return 0;
        }
        let room = self.canvas.1 as i64 - self.message_y - self.bottom_reserve;
        (room / self.line_height).max(0) as usize
    }

    pub fn name_origin(&self) -> (i64, i64) {
        (self.content_x(), self.message_y + self.name_offset_y)
    }

    /// Top-left of body slot `line` (0-based).
    pub fn body_origin(&self, line: usize) -> (i64, i64) {
        (
            self.content_x(),
            self.message_y + self.body_offset_y + line as i64 * self.line_height,
        )
    }
}

/// The quoted message, as supplied by the chat client.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageMeta {
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub body: String,
    pub sent_at: DateTime<Local>,
}

impl MessageMeta {
    /// Short `HH:MM` label for the header line.
    pub fn time_label(&self) -> String {
        self.sent_at.format("%H:%M").to_string()
    }
}

/// Which body lines are drawn, and whether an ellipsis follows them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyPlan {
    pub lines: Vec<String>,
    pub ellipsis: bool,
}

/// Wrap the message body into the content column and cut it to
/// [`CardLayout::max_lines`].
pub fn plan_body(layout: &CardLayout, body: &str) -> BodyPlan {
    let body = if body.is_empty() { EMPTY_BODY } else { body };
    let mut lines = text::wrap(body, layout.content_width(), layout.body_font);
    let max_lines = layout.max_lines();
    let ellipsis = lines.len() > max_lines;
    lines.truncate(max_lines);
    BodyPlan { lines, ellipsis }
}

/// Every text run on the card, in drawing order: name, time label, body
/// lines, then the ellipsis if the body was cut.
pub fn card_text(layout: &CardLayout, meta: &MessageMeta) -> Vec<TextBlock> {
    let palette = &layout.palette;
    let (name_x, name_y) = layout.name_origin();
    let name_width = text::measure(&meta.display_name, layout.username_font) as i64;
    let mut blocks = vec![
        TextBlock::new(
            meta.display_name.clone(),
            layout.username_font,
            (name_x, name_y),
            palette.name,
        ),
        TextBlock::new(
            format!(" — {}", meta.time_label()),
            layout.timestamp_font,
            (name_x + name_width + layout.timestamp_gap, name_y),
            palette.timestamp,
        ),
    ];

    let plan = plan_body(layout, &meta.body);
    let line_count = plan.lines.len();
    for (index, line) in plan.lines.into_iter().enumerate() {
        blocks.push(TextBlock::new(
            line,
            layout.body_font,
            layout.body_origin(index),
            palette.body,
        ));
    }
    if plan.ellipsis {
        blocks.push(TextBlock::new(
            ELLIPSIS,
            layout.body_font,
            layout.body_origin(line_count),
            palette.body,
        ));
    }
    blocks
}

/// Assemble the card canvas from already-fetched sub-resources.
///
/// `template` and `avatar` are encoded bytes; either may be absent or
/// undecodable, in which case its placeholder is drawn.
pub fn compose_card(
    layout: &CardLayout,
    template: Option<&[u8]>,
    avatar: Option<&[u8]>,
    meta: &MessageMeta,
) -> PixelBuffer {
    let (canvas_w, canvas_h) = layout.canvas;
    let canvas = PixelBuffer::transparent(canvas_w, canvas_h);

    let with_template = match template_layer(layout, template) {
        Ok(layer) => compose::composite(&canvas, &layer, 0, 0),
        Err(reason) => {
            log::warn!("reply card template unavailable ({reason}), using placeholder");
            let (w, h, x, y) = layout.template_placeholder;
            let placeholder = PixelBuffer::solid(w, h, layout.palette.template_placeholder);
            compose::composite(&canvas, &placeholder, x, y)
        }
    };

    let (avatar_x, avatar_y) = layout.avatar_origin();
    let avatar_layer = avatar_layer(layout, avatar).unwrap_or_else(|reason| {
        log::warn!("reply card avatar unavailable ({reason}), using placeholder");
        compose::filled_circle(layout.avatar_size, layout.palette.avatar_placeholder)
    });
    let with_avatar = compose::composite(&with_template, &avatar_layer, avatar_x, avatar_y);

    card_text(layout, meta)
        .iter()
        .fold(with_avatar, |card, block| text::render(&card, block))
}

fn template_layer(layout: &CardLayout, template: Option<&[u8]>) -> std::result::Result<PixelBuffer, String> {
    let bytes = template.ok_or("no template configured")?;
    let decoded = codec::decode(bytes).map_err(|e| e.to_string())?;
    let (w, h) = layout.template;
    geometry::resize(&decoded, w, h, Fit::Fill).map_err(|e| e.to_string())
}

fn avatar_layer(layout: &CardLayout, avatar: Option<&[u8]>) -> std::result::Result<PixelBuffer, String> {
    let bytes = avatar.ok_or("no avatar")?;
    let decoded = codec::decode(bytes).map_err(|e| e.to_string())?;
    let size = layout.avatar_size;
    let square = geometry::resize(&decoded, size, size, Fit::Fill).map_err(|e| e.to_string())?;
    geometry::circular_mask(&square).map_err(|e| e.to_string())
}

/// Builds reply cards, fetching avatars through a [`ByteSource`].
#[derive(Debug)]
pub struct ReplyCardRenderer<S> {
    source: S,
    layout: CardLayout,
    template: Option<Vec<u8>>,
}

impl<S: ByteSource> ReplyCardRenderer<S> {
    pub fn new(source: S, layout: CardLayout) -> Self {
        Self {
            source,
            layout,
            template: None,
        }
    }

    /// Encoded template image drawn across the top of every card.
    pub fn with_template(mut self, template: Option<Vec<u8>>) -> Self {
        self.template = template;
        self
    }

    pub fn layout(&self) -> &CardLayout {
        &self.layout
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Render `meta` to PNG bytes (alpha preserved).
    pub async fn try_render(&self, meta: &MessageMeta) -> Result<Vec<u8>> {
        let avatar = match &meta.avatar_url {
            Some(url) => match self.source.fetch(url).await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    log::warn!("avatar fetch failed: {e}");
                    None
                }
            },
            None => None,
        };
        let card = compose_card(
            &self.layout,
            self.template.as_deref(),
            avatar.as_deref(),
            meta,
        );
        codec::encode(&card, OutputFormat::Png, Quality::default())
    }

    pub async fn render(&self, meta: &MessageMeta) -> Option<Vec<u8>> {
        match self.try_render(meta).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::error!("reply card failed for {}: {e}", meta.display_name);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::MemorySource;
    use chrono::TimeZone;

    fn meta(body: &str) -> MessageMeta {
        MessageMeta {
            display_name: "ana".into(),
            avatar_url: Some("mem://avatar".into()),
            body: body.into(),
            sent_at: Local.with_ymd_and_hms(2024, 3, 1, 9, 5, 0).unwrap(),
        }
    }

    fn png(width: u32, height: u32, color: Rgba<u8>) -> Vec<u8> {
        codec::encode(&PixelBuffer::solid(width, height, color), OutputFormat::Png, Quality::default())
            .unwrap()
    }

    /// 300 characters of four-letter words.
    fn long_body() -> String {
        let mut text = vec!["word"; 60].join(" ");
        text.push('!');
        text
    }

    // =========================================================================
    // Layout
    // =========================================================================

    #[test]
    fn standard_layout_geometry() {
        let layout = CardLayout::default();
        assert_eq!(layout.content_x(), 72);
        assert_eq!(layout.content_width(), 223);
        assert_eq!(layout.max_lines(), 2);
        assert_eq!(layout.avatar_origin(), (20, 355));
        assert_eq!(layout.name_origin(), (72, 371));
        assert_eq!(layout.body_origin(0), (72, 395));
        assert_eq!(layout.body_origin(1), (72, 413));
        assert_eq!(layout.body_origin(2), (72, 431));
    }

    #[test]
    fn time_label_is_hours_and_minutes() {
        assert_eq!(meta("").time_label(), "09:05");
    }

    // =========================================================================
    // Body planning
    // =========================================================================

    #[test]
    fn empty_body_gets_a_stand_in() {
        // 17 glyphs are wider than the column, so the stand-in wraps too
        let plan = plan_body(&CardLayout::default(), "");
        assert_eq!(plan.lines, vec!["*No text", "content*"]);
        assert_eq!(plan.lines.join(" "), EMPTY_BODY);
        assert!(!plan.ellipsis);
    }

    #[test]
    fn whitespace_body_is_kept_as_is() {
        let plan = plan_body(&CardLayout::default(), "   ");
        assert_eq!(plan.lines, vec![String::new()]);
        assert!(!plan.ellipsis);
    }

    #[test]
    fn short_body_fits_without_ellipsis() {
        let plan = plan_body(&CardLayout::default(), "hi there");
        assert_eq!(plan.lines, vec!["hi there"]);
        assert!(!plan.ellipsis);
    }

    #[test]
    fn long_body_is_cut_to_max_lines_with_ellipsis() {
        let body = long_body();
        assert_eq!(body.chars().count(), 300);
        let plan = plan_body(&CardLayout::default(), &body);
        assert_eq!(plan.lines.len(), 2);
        assert!(plan.ellipsis);
        // 12 glyphs per line at most: "word word" (9) fits, a third word (14) does not
        assert_eq!(plan.lines[0], "word word");
    }

    #[test]
    fn card_text_places_every_run() {
        let layout = CardLayout::default();
        let blocks = card_text(&layout, &meta(&long_body()));
        assert_eq!(blocks.len(), 5);
        assert_eq!(blocks[0].text, "ana");
        assert_eq!(blocks[0].origin, (72, 371));
        // "ana" at scale 4: 3 * 36 - 4 = 104; then the 8px gap
        assert_eq!(blocks[1].text, " — 09:05");
        assert_eq!(blocks[1].origin, (72 + 104 + 8, 371));
        assert_eq!(blocks[2].origin, (72, 395));
        assert_eq!(blocks[3].origin, (72, 413));
        assert_eq!(blocks[4].text, ELLIPSIS);
        assert_eq!(blocks[4].origin, (72, 431));
    }

    // =========================================================================
    // Composition
    // =========================================================================

    #[test]
    fn placeholders_stand_in_for_missing_resources() {
        let layout = CardLayout::default();
        let card = compose_card(&layout, None, Some(b"broken"), &meta("x"));
        assert_eq!(card.dimensions(), (315, 460));
        assert_eq!(card.pixel(100, 100), layout.palette.template_placeholder);
        assert_eq!(card.pixel(10, 10)[3], 0);
        assert_eq!(card.pixel(40, 375), layout.palette.avatar_placeholder);
        assert_eq!(card.pixel(20, 355)[3], 0);
    }

    #[test]
    fn template_is_stretched_over_the_top() {
        let green = Rgba([0, 200, 0, 255]);
        let template = png(30, 60, green);
        let card = compose_card(&CardLayout::default(), Some(&template), None, &meta("x"));
        for (x, y) in [(0, 0), (157, 157), (314, 314)] {
            let p = card.pixel(x, y);
            assert!(p[0] < 5 && p[1].abs_diff(200) < 5 && p[3] == 255, "({x},{y}) {p:?}");
        }
        assert_eq!(card.pixel(300, 340)[3], 0);
    }

    #[tokio::test]
    async fn render_produces_png_with_avatar() {
        let source = MemorySource::new().with("mem://avatar", png(64, 64, Rgba([255, 0, 0, 255])));
        let renderer = ReplyCardRenderer::new(source, CardLayout::default());
        let bytes = renderer.render(&meta("hello")).await.unwrap();

        let info = codec::metadata(&bytes).unwrap();
        assert_eq!((info.width, info.height, info.channels), (315, 460, 4));
        let card = codec::decode(&bytes).unwrap();
        let p = card.pixel(40, 375);
        assert!(p[0] > 250 && p[1] < 5 && p[2] < 5 && p[3] == 255, "got {p:?}");
        assert_eq!(renderer.source().requests(), vec!["mem://avatar"]);
    }

    #[tokio::test]
    async fn failed_avatar_fetch_still_renders() {
        let renderer = ReplyCardRenderer::new(MemorySource::new(), CardLayout::default());
        let bytes = renderer.render(&meta("hello")).await.unwrap();
        let card = codec::decode(&bytes).unwrap();
        assert_eq!(card.pixel(40, 375), renderer.layout().palette.avatar_placeholder);
    }
}
