//! Captions rendered with the system TrueType faces. Skipped when the
//! DejaVu fonts are not installed.

use std::num::NonZeroU32;

use image::{Rgba, RgbaImage};
use poster_studio::compositor::{Anchor, Emphasis, TextEntry, TextStyle, compose, layout};
use poster_studio::constants::{DEFAULT_BOLD_FONTS, DEFAULT_REGULAR_FONTS, ENTRY_GAP};
use poster_studio::fonts::{FontBook, Typeface};

fn dejavu() -> Option<FontBook> {
    let book = FontBook::resolve(DEFAULT_BOLD_FONTS, DEFAULT_REGULAR_FONTS);
    if book.is_degraded() {
        eprintln!("DejaVu fonts not installed, skipping");
        return None;
    }
    Some(book)
}

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
fn resolved_faces_are_outlines() {
    let Some(fonts) = dejavu() else { return };
    assert!(matches!(fonts.face(Emphasis::Primary), Typeface::Outline(_)));
    assert!(matches!(fonts.face(Emphasis::Secondary), Typeface::Outline(_)));
}

#[test]
fn hello_is_centred_below_the_top_cursor() {
    let Some(fonts) = dejavu() else { return };
    let base = backdrop(1080, 1080);
    let entries = [TextEntry::new("HELLO", Emphasis::Primary, Anchor::Top)];

    let placed = layout(1080, 1080, &entries, Anchor::Top, &style(50), &fonts);
    assert_eq!(placed.len(), 1);
    assert_eq!(placed[0].cursor, 40);
    // capitals start below the ascender line
    assert!(placed[0].mask.top > 0);

    let out = compose(&base, &entries, Anchor::Top, &style(50), &fonts);
    let (x0, y0, x1, _) = changed_bounds(&base, &out).expect("caption drawn");
    assert!((37..=55).contains(&y0), "caption started at {y0}");
    let centre = (x0 + x1 + 1) as f32 / 2.0;
    assert!((centre - 540.0).abs() <= 1.0, "centre was {centre}");
}

#[test]
fn lower_case_renders_as_capitals() {
    let Some(fonts) = dejavu() else { return };
    let base = backdrop(600, 400);
    let lower = [TextEntry::new("abc", Emphasis::Secondary, Anchor::Center)];
    let upper = [TextEntry::new("ABC", Emphasis::Secondary, Anchor::Center)];
    assert_eq!(
        compose(&base, &lower, Anchor::Center, &style(48), &fonts),
        compose(&base, &upper, Anchor::Center, &style(48), &fonts)
    );
}

#[test]
fn stacked_entries_advance_by_height_and_gap() {
    let Some(fonts) = dejavu() else { return };
    let entries = [
        TextEntry::new("hello", Emphasis::Primary, Anchor::Top),
        TextEntry::new("world", Emphasis::Secondary, Anchor::Top),
    ];
    let placed = layout(1080, 1080, &entries, Anchor::Top, &style(50), &fonts);
    assert_eq!(placed.len(), 2);
    assert_eq!(
        placed[1].cursor,
        placed[0].cursor + i64::from(placed[0].mask.height) + ENTRY_GAP
    );
    // secondary text is drawn at the smaller size
    assert!(placed[1].mask.height < placed[0].mask.height);
}
