//! Shared constants for layout, exports and the web layer
//!

use std::sync::LazyLock;

/// Cursor start for the top band, in pixels from the top edge.
pub const TOP_CURSOR: i64 = 40;

/// Distance above the vertical midpoint where the center band starts.
pub const CENTER_CURSOR_LIFT: i64 = 50;

/// Distance above the bottom edge where the bottom band starts.
pub const BOTTOM_CURSOR_LIFT: i64 = 150;

/// Gap between stacked caption blocks.
pub const ENTRY_GAP: i64 = 20;

/// Outline stamps run from `-OUTLINE_RADIUS..=OUTLINE_RADIUS` on both axes.
pub const OUTLINE_RADIUS: i64 = 3;

/// Secondary captions are drawn at this fraction of the base size.
pub const SECONDARY_SCALE: f32 = 0.6;

/// Extra spacing between lines of a multi-line caption.
pub const LINE_SPACING: f32 = 4.0;

/// JPEG quality for the print download.
pub const JPEG_QUALITY: u8 = 95;

/// Longest side of the web download.
pub const WEB_BOUND: u32 = 800;

/// Longest side of the messaging download.
pub const WHATSAPP_BOUND: u32 = 400;

/// Default text-to-image endpoint, the prompt is appended as a path segment.
pub const DEFAULT_GENERATOR_URL: &str = "https://image.pollinations.ai/prompt/";

/// Default client timeout for the generation call, in seconds.
pub const DEFAULT_GENERATOR_TIMEOUT_SECONDS: u64 = 30;

/// Fonts tried for headline text when none is configured.
pub const DEFAULT_BOLD_FONTS: &[&str] = &["/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf"];

/// Fonts tried for secondary text when none is configured.
pub const DEFAULT_REGULAR_FONTS: &[&str] = &["/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"];

/// Caption size the slider starts at.
pub const DEFAULT_TEXT_SIZE: u32 = 50;

/// Allowed range for the caption size slider.
pub const TEXT_SIZE_RANGE: std::ops::RangeInclusive<u32> = 24..=100;

/// Allowed range for custom width and height.
pub const CUSTOM_DIMENSION_RANGE: std::ops::RangeInclusive<u32> = 512..=4096;

/// Allowed range for the effect sliders.
pub const EFFECT_RANGE: std::ops::RangeInclusive<f32> = 0.5..=1.5;

/// Session inactivity timeout, in hours.
pub const SESSION_INACTIVITY_HOURS: i64 = 12;

/// Max age (in seconds) for download cache entries.
pub const DOWNLOAD_CACHE_MAX_AGE_SECONDS: u64 = 60 * 60;

/// Cache-Control value for downloads. Designs belong to one session.
pub static DOWNLOAD_CACHE_CONTROL: LazyLock<String> =
    LazyLock::new(|| format!("private, max-age={}", DOWNLOAD_CACHE_MAX_AGE_SECONDS));
