//! Caption compositing.
//!
//! Captions are upper-cased, centred horizontally and stacked downwards from
//! an anchor, each drawn over a 7×7 grid of outline stamps. All drawing
//! happens on a copy; the input image is never touched.

use std::num::NonZeroU32;

use image::{Rgba, RgbaImage};
use serde::Deserialize;

use crate::constants::{
    BOTTOM_CURSOR_LIFT, CENTER_CURSOR_LIFT, ENTRY_GAP, OUTLINE_RADIUS, SECONDARY_SCALE, TOP_CURSOR,
};
use crate::fonts::{FontBook, TextMask};

/// Which size and face a caption uses.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Emphasis {
    /// Headline: base size, bold face.
    Primary,
    /// Everything else: 60% of the base size, regular face.
    Secondary,
}

/// Where a run of captions starts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Anchor {
    /// Near the top edge.
    Top,
    /// Just above the vertical midpoint.
    Center,
    /// Near the bottom edge.
    Bottom,
}

impl Anchor {
    /// Initial vertical cursor for an image of the given height.
    pub fn start_cursor(self, image_height: u32) -> i64 {
        let height = i64::from(image_height);
        match self {
            Anchor::Top => TOP_CURSOR,
            Anchor::Center => height / 2 - CENTER_CURSOR_LIFT,
            Anchor::Bottom => height - BOTTOM_CURSOR_LIFT,
        }
    }
}

/// Text position picked in the form.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
pub enum VerticalAnchor {
    /// One band at the top.
    #[default]
    Top,
    /// One band in the middle.
    Center,
    /// One band at the bottom.
    Bottom,
    /// Two bands, split by each entry's target.
    TopAndBottom,
    /// No captions at all.
    None,
}

impl VerticalAnchor {
    /// All positions, in form order.
    pub const ALL: [VerticalAnchor; 5] = [
        VerticalAnchor::Top,
        VerticalAnchor::Bottom,
        VerticalAnchor::Center,
        VerticalAnchor::TopAndBottom,
        VerticalAnchor::None,
    ];

    /// Form value.
    pub fn value(self) -> &'static str {
        match self {
            VerticalAnchor::Top => "Top",
            VerticalAnchor::Center => "Center",
            VerticalAnchor::Bottom => "Bottom",
            VerticalAnchor::TopAndBottom => "TopAndBottom",
            VerticalAnchor::None => "None",
        }
    }

    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            VerticalAnchor::TopAndBottom => "Top & Bottom",
            other => other.value(),
        }
    }
}

/// One caption to draw.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TextEntry {
    /// Caption text; empty entries are skipped.
    pub content: String,
    /// Size and face.
    pub emphasis: Emphasis,
    /// Band the caption belongs to when the request uses two bands.
    pub target: Anchor,
}

impl TextEntry {
    /// Builds an entry.
    pub fn new(content: impl Into<String>, emphasis: Emphasis, target: Anchor) -> Self {
        Self {
            content: content.into(),
            emphasis,
            target,
        }
    }
}

/// Size and colours shared by every caption in a request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TextStyle {
    /// Size of primary captions, in pixels.
    pub base_size: NonZeroU32,
    /// Fill colour.
    pub text_color: Rgba<u8>,
    /// Outline colour.
    pub outline_color: Rgba<u8>,
}

impl TextStyle {
    /// Resolved pixel size for a caption role.
    pub fn font_size(&self, emphasis: Emphasis) -> f32 {
        let base = self.base_size.get() as f32;
        match emphasis {
            Emphasis::Primary => base,
            Emphasis::Secondary => (base * SECONDARY_SCALE).round().max(1.0),
        }
    }
}

/// A caption after layout.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedText {
    /// Left edge of the ink; negative when the caption is wider than the image.
    pub x: i64,
    /// Vertical cursor the caption was placed at.
    pub cursor: i64,
    /// Rendered ink.
    pub mask: TextMask,
}

impl PlacedText {
    /// First inked row.
    pub fn ink_top(&self) -> i64 {
        self.cursor + self.mask.top
    }
}

/// Measures and positions the non-empty entries, in order, starting at the
/// anchor's cursor.
pub fn layout(
    width: u32,
    height: u32,
    entries: &[TextEntry],
    anchor: Anchor,
    style: &TextStyle,
    fonts: &FontBook,
) -> Vec<PlacedText> {
    let mut cursor = anchor.start_cursor(height);
    let mut placed = Vec::with_capacity(entries.len());
    for entry in entries.iter().filter(|entry| !entry.content.is_empty()) {
        let text = entry.content.to_uppercase();
        let mask = fonts
            .face(entry.emphasis)
            .rasterize(&text, style.font_size(entry.emphasis));
        let x = (i64::from(width) - i64::from(mask.width)).div_euclid(2);
        let next_cursor = cursor + i64::from(mask.height) + ENTRY_GAP;
        placed.push(PlacedText { x, cursor, mask });
        cursor = next_cursor;
    }
    placed
}

/// Draws the entries onto a copy of `image`, starting at `anchor`.
pub fn compose(
    image: &RgbaImage,
    entries: &[TextEntry],
    anchor: Anchor,
    style: &TextStyle,
    fonts: &FontBook,
) -> RgbaImage {
    let mut canvas = image.clone();
    for placed in layout(
        canvas.width(),
        canvas.height(),
        entries,
        anchor,
        style,
        fonts,
    ) {
        draw_outlined(&mut canvas, &placed, style);
    }
    canvas
}

fn draw_outlined(canvas: &mut RgbaImage, placed: &PlacedText, style: &TextStyle) {
    if placed.mask.is_empty() {
        return;
    }
    let y = placed.ink_top();
    for dx in -OUTLINE_RADIUS..=OUTLINE_RADIUS {
        for dy in -OUTLINE_RADIUS..=OUTLINE_RADIUS {
            stamp(
                canvas,
                &placed.mask,
                placed.x + dx,
                y + dy,
                style.outline_color,
            );
        }
    }
    stamp(canvas, &placed.mask, placed.x, y, style.text_color);
}

/// Blends `color` through the mask at (x, y), clipping at the image edges.
fn stamp(canvas: &mut RgbaImage, mask: &TextMask, x: i64, y: i64, color: Rgba<u8>) {
    let (width, height) = canvas.dimensions();
    for (mask_x, mask_y, coverage) in mask.inked() {
        let (Ok(px), Ok(py)) = (
            u32::try_from(x + i64::from(mask_x)),
            u32::try_from(y + i64::from(mask_y)),
        ) else {
            continue;
        };
        if px >= width || py >= height {
            continue;
        }
        blend(canvas.get_pixel_mut(px, py), color, coverage);
    }
}

fn blend(dst: &mut Rgba<u8>, color: Rgba<u8>, coverage: f32) {
    let alpha = coverage * f32::from(color.0[3]) / 255.0;
    if alpha <= 0.0 {
        return;
    }
    let inverse = 1.0 - alpha;
    for channel in 0..3 {
        dst.0[channel] =
            (f32::from(color.0[channel]) * alpha + f32::from(dst.0[channel]) * inverse).round()
                as u8;
    }
    dst.0[3] = (255.0 * alpha + f32::from(dst.0[3]) * inverse).round() as u8;
}

/// Everything needed to caption one image.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CompositionRequest {
    /// Captions in drawing order.
    pub entries: Vec<TextEntry>,
    /// Where the captions go.
    pub vertical_anchor: VerticalAnchor,
    /// Size and colours.
    pub style: TextStyle,
}

impl CompositionRequest {
    /// Produces the captioned copy. `TopAndBottom` composes twice: entries
    /// targeted at the bottom band start at the bottom anchor, everything
    /// else at the top. `None` returns an untouched copy.
    pub fn render(&self, image: &RgbaImage, fonts: &FontBook) -> RgbaImage {
        match self.vertical_anchor {
            VerticalAnchor::None => image.clone(),
            VerticalAnchor::Top => compose(image, &self.entries, Anchor::Top, &self.style, fonts),
            VerticalAnchor::Center => {
                compose(image, &self.entries, Anchor::Center, &self.style, fonts)
            }
            VerticalAnchor::Bottom => {
                compose(image, &self.entries, Anchor::Bottom, &self.style, fonts)
            }
            VerticalAnchor::TopAndBottom => {
                let (bottom, top): (Vec<TextEntry>, Vec<TextEntry>) = self
                    .entries
                    .iter()
                    .cloned()
                    .partition(|entry| entry.target == Anchor::Bottom);
                let upper = compose(image, &top, Anchor::Top, &self.style, fonts);
                compose(&upper, &bottom, Anchor::Bottom, &self.style, fonts)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(size: u32) -> TextStyle {
        TextStyle {
            base_size: NonZeroU32::new(size).expect("non-zero size"),
            text_color: Rgba([255, 255, 255, 255]),
            outline_color: Rgba([0, 0, 0, 255]),
        }
    }

    fn backdrop(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([40, 90, 160, 255]))
    }

    /// Inclusive bounds of pixels that differ from `base`.
    fn changed_bounds(base: &RgbaImage, out: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (x, y, pixel) in out.enumerate_pixels() {
            if base.get_pixel(x, y) == pixel {
                continue;
            }
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
        bounds
    }

    #[test]
    fn secondary_size_is_rounded_sixty_percent() {
        assert_eq!(style(50).font_size(Emphasis::Primary), 50.0);
        assert_eq!(style(50).font_size(Emphasis::Secondary), 30.0);
        assert_eq!(style(24).font_size(Emphasis::Secondary), 14.0);
    }

    #[test]
    fn anchors_resolve_start_cursor() {
        assert_eq!(Anchor::Top.start_cursor(1080), 40);
        assert_eq!(Anchor::Center.start_cursor(1080), 490);
        assert_eq!(Anchor::Bottom.start_cursor(1080), 930);
    }

    #[test]
    fn empty_entry_list_is_pixel_identical() {
        let base = backdrop(64, 48);
        let out = compose(&base, &[], Anchor::Top, &style(30), &FontBook::builtin());
        assert_eq!(out, base);
    }

    #[test]
    fn empty_content_is_skipped() {
        let fonts = FontBook::builtin();
        let entries = vec![
            TextEntry::new("", Emphasis::Primary, Anchor::Top),
            TextEntry::new("HI", Emphasis::Secondary, Anchor::Top),
        ];
        let placed = layout(400, 400, &entries, Anchor::Top, &style(30), &fonts);
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].cursor, 40);
    }

    #[test]
    fn single_entry_is_centered() {
        let base = backdrop(500, 300);
        let entries = vec![TextEntry::new("Centre me", Emphasis::Primary, Anchor::Top)];
        let out = compose(&base, &entries, Anchor::Top, &style(40), &FontBook::builtin());
        let (x0, _, x1, _) = changed_bounds(&base, &out).expect("text drawn");
        let centre = (x0 + x1 + 1) as f32 / 2.0;
        assert!((centre - 250.0).abs() <= 1.0, "centre was {centre}");
    }

    #[test]
    fn second_entry_starts_below_first() {
        let fonts = FontBook::builtin();
        let entries = vec![
            TextEntry::new("first", Emphasis::Primary, Anchor::Top),
            TextEntry::new("second", Emphasis::Secondary, Anchor::Top),
        ];
        let placed = layout(800, 800, &entries, Anchor::Top, &style(50), &fonts);
        assert_eq!(placed.len(), 2);
        assert!(placed[1].cursor > placed[0].cursor);
        assert_eq!(
            placed[1].cursor,
            placed[0].cursor + i64::from(placed[0].mask.height) + ENTRY_GAP
        );
    }

    #[test]
    fn lower_case_matches_upper_case() {
        let base = backdrop(300, 200);
        let fonts = FontBook::builtin();
        let lower = compose(
            &base,
            &[TextEntry::new("abc", Emphasis::Primary, Anchor::Center)],
            Anchor::Center,
            &style(32),
            &fonts,
        );
        let upper = compose(
            &base,
            &[TextEntry::new("ABC", Emphasis::Primary, Anchor::Center)],
            Anchor::Center,
            &style(32),
            &fonts,
        );
        assert_eq!(lower, upper);
    }

    #[test]
    fn outline_surrounds_fill() {
        let base = backdrop(200, 200);
        let out = compose(
            &base,
            &[TextEntry::new("I", Emphasis::Primary, Anchor::Top)],
            Anchor::Top,
            &style(40),
            &FontBook::builtin(),
        );
        let (x0, y0, x1, y1) = changed_bounds(&base, &out).expect("text drawn");
        assert_eq!(*out.get_pixel(x0, y0), Rgba([0, 0, 0, 255]));
        assert_eq!(*out.get_pixel(x1, y1), Rgba([0, 0, 0, 255]));
        let centre = out.get_pixel((x0 + x1) / 2, (y0 + y1) / 2);
        assert_eq!(*centre, Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn wide_text_clips_instead_of_failing() {
        let base = backdrop(40, 40);
        let entries = vec![TextEntry::new(
            "far too wide for this image",
            Emphasis::Primary,
            Anchor::Top,
        )];
        let placed = layout(40, 40, &entries, Anchor::Top, &style(60), &FontBook::builtin());
        assert!(placed[0].x < 0);
        let out = compose(&base, &entries, Anchor::Top, &style(60), &FontBook::builtin());
        assert_eq!(out.dimensions(), (40, 40));
    }

    #[test]
    fn input_is_left_untouched() {
        let base = backdrop(120, 120);
        let copy = base.clone();
        let _ = compose(
            &base,
            &[TextEntry::new("x", Emphasis::Primary, Anchor::Top)],
            Anchor::Top,
            &style(30),
            &FontBook::builtin(),
        );
        assert_eq!(base, copy);
    }

    #[test]
    fn none_anchor_skips_compositing() {
        let base = backdrop(100, 100);
        let request = CompositionRequest {
            entries: vec![TextEntry::new("hidden", Emphasis::Primary, Anchor::Top)],
            vertical_anchor: VerticalAnchor::None,
            style: style(30),
        };
        assert_eq!(request.render(&base, &FontBook::builtin()), base);
    }

    #[test]
    fn top_and_bottom_splits_bands() {
        let base = backdrop(400, 600);
        let fonts = FontBook::builtin();
        let request = CompositionRequest {
            entries: vec![TextEntry::new("footer", Emphasis::Secondary, Anchor::Bottom)],
            vertical_anchor: VerticalAnchor::TopAndBottom,
            style: style(30),
        };
        let out = request.render(&base, &fonts);
        let (_, y0, _, _) = changed_bounds(&base, &out).expect("footer drawn");
        // bottom band starts at 600 - 150, outline reaches 3px above the ink
        assert_eq!(i64::from(y0), 450 - OUTLINE_RADIUS);
    }
}
