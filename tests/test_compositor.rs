use std::num::NonZeroU32;

use image::{Rgba, RgbaImage};
use poster_studio::compositor::{
    Anchor, CompositionRequest, Emphasis, TextEntry, TextStyle, VerticalAnchor, compose,
};
use poster_studio::export::ExportFormat;
use poster_studio::fonts::FontBook;

fn style(size: u32) -> TextStyle {
    TextStyle {
        base_size: NonZeroU32::new(size).expect("non-zero"),
        text_color: Rgba([255, 255, 255, 255]),
        outline_color: Rgba([0, 0, 0, 255]),
    }
}

fn backdrop(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 251) as u8, (y % 241) as u8, 128, 255])
    })
}

/// Inclusive bounds of changed pixels within the given rows.
fn changed_bounds(
    base: &RgbaImage,
    out: &RgbaImage,
    rows: std::ops::Range<u32>,
) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for y in rows {
        for x in 0..base.width() {
            if base.get_pixel(x, y) == out.get_pixel(x, y) {
                continue;
            }
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
    }
    bounds
}

#[test]
fn hello_headline_on_square_post() {
    let base = backdrop(1080, 1080);
    let entries = [TextEntry::new("HELLO", Emphasis::Primary, Anchor::Top)];
    let out = compose(&base, &entries, Anchor::Top, &style(50), &FontBook::builtin());

    let (x0, y0, x1, y1) = changed_bounds(&base, &out, 0..1080).expect("caption drawn");
    // outline reaches three pixels above the ink
    assert_eq!(y0, 37);
    assert!(y1 < 140, "caption ran down to {y1}");
    let centre = (x0 + x1 + 1) as f32 / 2.0;
    assert!((centre - 540.0).abs() <= 1.0, "centre was {centre}");
}

#[test]
fn no_position_leaves_image_untouched() {
    let base = backdrop(320, 240);
    let request = CompositionRequest {
        entries: vec![TextEntry::new("ignored", Emphasis::Primary, Anchor::Top)],
        vertical_anchor: VerticalAnchor::None,
        style: style(40),
    };
    assert_eq!(request.render(&base, &FontBook::builtin()), base);
}

#[test]
fn top_and_bottom_uses_both_bands() {
    let base = backdrop(600, 800);
    let request = CompositionRequest {
        entries: vec![
            TextEntry::new("up here", Emphasis::Primary, Anchor::Top),
            TextEntry::new("down there", Emphasis::Secondary, Anchor::Bottom),
        ],
        vertical_anchor: VerticalAnchor::TopAndBottom,
        style: style(40),
    };
    let out = request.render(&base, &FontBook::builtin());

    let (_, top_y0, _, _) = changed_bounds(&base, &out, 0..400).expect("top caption");
    assert!((37..=45).contains(&top_y0), "top band started at {top_y0}");
    let (_, bottom_y0, _, _) = changed_bounds(&base, &out, 400..800).expect("bottom caption");
    assert!(
        (647..=655).contains(&bottom_y0),
        "bottom band started at {bottom_y0}"
    );
}

#[test]
fn stacked_captions_do_not_overlap() {
    let base = backdrop(800, 800);
    let fonts = FontBook::builtin();
    let entries = [
        TextEntry::new("first line", Emphasis::Primary, Anchor::Center),
        TextEntry::new("second", Emphasis::Secondary, Anchor::Center),
    ];
    let placed =
        poster_studio::compositor::layout(800, 800, &entries, Anchor::Center, &style(48), &fonts);
    assert_eq!(placed.len(), 2);
    assert_eq!(placed[0].cursor, 350);
    assert!(placed[1].cursor >= placed[0].cursor + i64::from(placed[0].mask.height));

    let out = compose(&base, &entries, Anchor::Center, &style(48), &fonts);
    assert_ne!(out, base);
}

#[test]
fn captioned_design_exports_small_variant() {
    let base = backdrop(1080, 1920);
    let entries = [TextEntry::new("story time", Emphasis::Primary, Anchor::Bottom)];
    let out = compose(&base, &entries, Anchor::Bottom, &style(60), &FontBook::builtin());
    let bytes = ExportFormat::WhatsApp.encode(&out).expect("encode");
    let small = image::load_from_memory(&bytes).expect("decode");
    assert_eq!((small.width(), small.height()), (225, 400));
}
