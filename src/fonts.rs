//! Font loading and glyph rasterization for caption overlays.
//!
//! Fonts are resolved once at startup into a [`FontBook`]. When no outline
//! font can be loaded for both caption roles, both roles share the built-in
//! 8×8 bitmap face instead of failing.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontArc, GlyphId, InvalidFont, PxScale, ScaleFont, point};
use tracing::{debug, info, warn};

use crate::compositor::Emphasis;
use crate::constants::LINE_SPACING;

/// Errors returned when loading a font file.
#[derive(Debug)]
pub enum FontError {
    /// No file at the path.
    NotFound(PathBuf),
    /// The file exists but could not be read.
    Unreadable(PathBuf, std::io::Error),
    /// The file is not a usable TrueType/OpenType font.
    Invalid(PathBuf, InvalidFont),
}

impl fmt::Display for FontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "Font not found: {}", path.display()),
            Self::Unreadable(path, err) => {
                write!(f, "Failed to read font {}: {err}", path.display())
            }
            Self::Invalid(path, err) => write!(f, "Invalid font {}: {err}", path.display()),
        }
    }
}

impl std::error::Error for FontError {}

/// Loads an outline font from disk.
pub fn try_load_font(path: &Path) -> Result<FontArc, FontError> {
    let data = std::fs::read(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => FontError::NotFound(path.to_path_buf()),
        _ => FontError::Unreadable(path.to_path_buf(), err),
    })?;
    FontArc::try_from_vec(data).map_err(|err| FontError::Invalid(path.to_path_buf(), err))
}

/// A face that captions can be rendered with.
#[derive(Clone)]
pub enum Typeface {
    /// A scalable TrueType/OpenType face.
    Outline(FontArc),
    /// The built-in 8×8 bitmap face, scaled in whole cells.
    Builtin,
}

impl fmt::Debug for Typeface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outline(_) => f.write_str("Typeface::Outline"),
            Self::Builtin => f.write_str("Typeface::Builtin"),
        }
    }
}

impl Typeface {
    /// Distance between the tops of consecutive lines.
    pub fn line_height(&self, px: f32) -> f32 {
        match self {
            Self::Outline(font) => font.as_scaled(PxScale::from(px)).height() + LINE_SPACING,
            Self::Builtin => (8 * builtin_cell(px)) as f32 + LINE_SPACING,
        }
    }

    /// Renders `text` into a coverage mask cropped to its ink. Lines split on
    /// `\n` are each centred inside the block.
    pub fn rasterize(&self, text: &str, px: f32) -> TextMask {
        let line_height = self.line_height(px);
        let lines: Vec<(i64, Raster)> = text
            .split('\n')
            .enumerate()
            .filter_map(|(idx, line)| {
                let (top, raster) = self.rasterize_line(line, px)?;
                let line_top = (idx as f32 * line_height).round() as i64;
                Some((line_top + top, raster))
            })
            .collect();

        let Some(top) = lines.iter().map(|(top, _)| *top).min() else {
            return TextMask::empty();
        };
        let bottom = lines
            .iter()
            .map(|(top, raster)| top + i64::from(raster.height))
            .max()
            .unwrap_or(top);
        let width = lines
            .iter()
            .map(|(_, raster)| raster.width)
            .max()
            .unwrap_or(0);
        let height = u32::try_from(bottom - top).unwrap_or(0);

        let mut block = Raster::new(width, height);
        for (line_top, raster) in &lines {
            let offset_x = i64::from((width - raster.width) / 2);
            block.blit(raster, offset_x, line_top - top);
        }

        TextMask {
            top,
            width: block.width,
            height: block.height,
            coverage: block.data,
        }
    }

    /// Returns the line's ink, and the row offset of that ink from the top
    /// of the line box. `None` when the line has no visible glyphs.
    fn rasterize_line(&self, line: &str, px: f32) -> Option<(i64, Raster)> {
        if line.is_empty() {
            return None;
        }
        let raster = match self {
            Self::Outline(font) => rasterize_outline(font, line, px)?,
            Self::Builtin => (0, rasterize_builtin(line, px)),
        };
        let (offset_top, raster) = raster;
        let (x0, y0, x1, y1) = raster.ink_bounds()?;
        Some((offset_top + i64::from(y0), raster.crop(x0, y0, x1, y1)))
    }
}

fn rasterize_outline(font: &FontArc, line: &str, px: f32) -> Option<(i64, Raster)> {
    let scale = PxScale::from(px);
    let scaled = font.as_scaled(scale);
    let mut caret = 0.0f32;
    let mut previous: Option<GlyphId> = None;
    let mut outlined = Vec::new();
    for ch in line.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(scale, point(caret, scaled.ascent()));
        caret += scaled.h_advance(id);
        previous = Some(id);
        if let Some(glyph) = font.outline_glyph(glyph) {
            outlined.push(glyph);
        }
    }

    let first = outlined.first()?.px_bounds();
    let (mut min_x, mut min_y, mut max_x, mut max_y) =
        (first.min.x, first.min.y, first.max.x, first.max.y);
    for glyph in &outlined {
        let bounds = glyph.px_bounds();
        min_x = min_x.min(bounds.min.x);
        min_y = min_y.min(bounds.min.y);
        max_x = max_x.max(bounds.max.x);
        max_y = max_y.max(bounds.max.y);
    }

    let mut raster = Raster::new(
        (max_x - min_x).ceil().max(0.0) as u32,
        (max_y - min_y).ceil().max(0.0) as u32,
    );
    for glyph in &outlined {
        let bounds = glyph.px_bounds();
        let offset_x = (bounds.min.x - min_x).round() as i64;
        let offset_y = (bounds.min.y - min_y).round() as i64;
        glyph.draw(|x, y, coverage| {
            raster.plot(offset_x + i64::from(x), offset_y + i64::from(y), coverage);
        });
    }
    Some((min_y.floor() as i64, raster))
}

/// Pixels per bitmap cell at the requested size.
fn builtin_cell(px: f32) -> u32 {
    ((px / 8.0).round() as u32).max(1)
}

fn builtin_glyph(ch: char) -> [u8; 8] {
    let code = ch as usize;
    match code {
        0..=0x7F => font8x8::legacy::BASIC_LEGACY[code],
        0xA0..=0xFF => font8x8::legacy::LATIN_LEGACY[code - 0xA0],
        _ => font8x8::legacy::BASIC_LEGACY[usize::from(b'?')],
    }
}

fn rasterize_builtin(line: &str, px: f32) -> Raster {
    let cell = builtin_cell(px);
    let glyph_size = 8 * cell;
    let count = line.chars().count() as u32;
    let mut raster = Raster::new(count * glyph_size, glyph_size);
    for (idx, ch) in line.chars().enumerate() {
        let origin_x = i64::from(idx as u32 * glyph_size);
        for (row, bits) in builtin_glyph(ch).iter().enumerate() {
            for col in 0..8u32 {
                if bits & (1 << col) == 0 {
                    continue;
                }
                let cell_x = origin_x + i64::from(col * cell);
                let cell_y = i64::from(row as u32 * cell);
                for dy in 0..i64::from(cell) {
                    for dx in 0..i64::from(cell) {
                        raster.plot(cell_x + dx, cell_y + dy, 1.0);
                    }
                }
            }
        }
    }
    raster
}

/// Coverage of one rendered caption, cropped to its ink.
#[derive(Clone, Debug, PartialEq)]
pub struct TextMask {
    /// Rows between the pen position and the first inked row.
    pub top: i64,
    /// Width of the ink box.
    pub width: u32,
    /// Height of the ink box.
    pub height: u32,
    coverage: Vec<f32>,
}

impl TextMask {
    /// A mask with no ink.
    pub fn empty() -> Self {
        Self {
            top: 0,
            width: 0,
            height: 0,
            coverage: Vec::new(),
        }
    }

    /// True when nothing would be drawn.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Coverage in `0.0..=1.0` at a position inside the mask.
    pub fn coverage(&self, x: u32, y: u32) -> f32 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.coverage[(y * self.width + x) as usize]
    }

    /// Inked positions with their coverage.
    pub(crate) fn inked(&self) -> impl Iterator<Item = (u32, u32, f32)> + '_ {
        let width = self.width.max(1);
        self.coverage
            .iter()
            .enumerate()
            .filter(|(_, coverage)| **coverage > 0.0)
            .map(move |(idx, coverage)| {
                let idx = idx as u32;
                (idx % width, idx / width, *coverage)
            })
    }
}

/// Scratch coverage buffer used while laying out glyphs.
#[derive(Debug)]
struct Raster {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl Raster {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; (width as usize) * (height as usize)],
        }
    }

    fn plot(&mut self, x: i64, y: i64, coverage: f32) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let idx = (y as usize) * (self.width as usize) + x as usize;
        self.data[idx] = self.data[idx].max(coverage.clamp(0.0, 1.0));
    }

    fn get(&self, x: u32, y: u32) -> f32 {
        self.data[(y as usize) * (self.width as usize) + x as usize]
    }

    /// Exclusive bounds of non-zero coverage.
    fn ink_bounds(&self) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for y in 0..self.height {
            for x in 0..self.width {
                if self.get(x, y) <= 0.0 {
                    continue;
                }
                bounds = Some(match bounds {
                    None => (x, y, x + 1, y + 1),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x + 1), y1.max(y + 1)),
                });
            }
        }
        bounds
    }

    fn crop(&self, x0: u32, y0: u32, x1: u32, y1: u32) -> Raster {
        let mut cropped = Raster::new(x1 - x0, y1 - y0);
        for y in y0..y1 {
            for x in x0..x1 {
                cropped.plot(i64::from(x - x0), i64::from(y - y0), self.get(x, y));
            }
        }
        cropped
    }

    fn blit(&mut self, other: &Raster, offset_x: i64, offset_y: i64) {
        for y in 0..other.height {
            for x in 0..other.width {
                self.plot(
                    offset_x + i64::from(x),
                    offset_y + i64::from(y),
                    other.get(x, y),
                );
            }
        }
    }
}

/// The faces used for each caption role.
#[derive(Clone, Debug)]
pub struct FontBook {
    primary: Typeface,
    secondary: Typeface,
}

impl FontBook {
    /// Walks the candidate lists once; the first loadable bold font serves
    /// headlines and the first loadable regular font serves everything else.
    /// If either role comes up empty both fall back to the built-in face.
    pub fn resolve<P: AsRef<Path>>(bold: &[P], regular: &[P]) -> Self {
        match (first_loadable(bold), first_loadable(regular)) {
            (Some(primary), Some(secondary)) => {
                info!("Caption fonts loaded");
                Self::from_faces(primary, secondary)
            }
            _ => {
                warn!("No usable caption fonts found, captions will use the built-in bitmap face");
                Self::builtin()
            }
        }
    }

    /// Both roles use the built-in bitmap face.
    pub fn builtin() -> Self {
        Self {
            primary: Typeface::Builtin,
            secondary: Typeface::Builtin,
        }
    }

    /// Uses the given outline faces.
    pub fn from_faces(primary: FontArc, secondary: FontArc) -> Self {
        Self {
            primary: Typeface::Outline(primary),
            secondary: Typeface::Outline(secondary),
        }
    }

    /// True when running on the built-in face.
    pub fn is_degraded(&self) -> bool {
        matches!(self.primary, Typeface::Builtin)
    }

    /// Face for a caption role.
    pub fn face(&self, emphasis: Emphasis) -> &Typeface {
        match emphasis {
            Emphasis::Primary => &self.primary,
            Emphasis::Secondary => &self.secondary,
        }
    }
}

fn first_loadable<P: AsRef<Path>>(candidates: &[P]) -> Option<FontArc> {
    candidates
        .iter()
        .find_map(|candidate| match try_load_font(candidate.as_ref()) {
            Ok(font) => Some(font),
            Err(err) => {
                debug!("Skipping caption font: {}", err);
                None
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_font_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nope.ttf");
        assert!(matches!(try_load_font(&path), Err(FontError::NotFound(_))));
    }

    #[test]
    fn garbage_font_is_invalid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("garbage.ttf");
        std::fs::write(&path, b"definitely not a font").expect("write garbage");
        assert!(matches!(try_load_font(&path), Err(FontError::Invalid(_, _))));
    }

    #[test]
    fn unresolvable_fonts_collapse_to_builtin() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("missing.ttf");
        let book = FontBook::resolve(&[missing.clone()], &[missing]);
        assert!(book.is_degraded());
        assert!(matches!(book.face(Emphasis::Primary), Typeface::Builtin));
        assert!(matches!(book.face(Emphasis::Secondary), Typeface::Builtin));
    }

    #[test]
    fn builtin_mask_is_cropped_to_ink() {
        // 'H' fills columns 0..6 of its cell and rows 0..7
        let mask = Typeface::Builtin.rasterize("H", 8.0);
        assert_eq!(mask.top, 0);
        assert_eq!(mask.width, 6);
        assert_eq!(mask.height, 7);
        assert_eq!(mask.coverage(0, 0), 1.0);
        assert_eq!(mask.coverage(2, 0), 0.0);
    }

    #[test]
    fn builtin_scales_in_whole_cells() {
        let small = Typeface::Builtin.rasterize("H", 8.0);
        let large = Typeface::Builtin.rasterize("H", 32.0);
        assert_eq!(large.width, small.width * 4);
        assert_eq!(large.height, small.height * 4);
    }

    #[test]
    fn multiline_blocks_stack_and_center_lines() {
        let single = Typeface::Builtin.rasterize("HH", 8.0);
        let block = Typeface::Builtin.rasterize("HHHH\nHH", 8.0);
        assert!(block.height > single.height * 2);
        let lower_row = block.height - 1;
        // the short second line is centred, so the left edge of the block is blank
        assert_eq!(block.coverage(0, lower_row), 0.0);
    }

    #[test]
    fn blank_text_has_no_ink() {
        assert!(Typeface::Builtin.rasterize("   ", 40.0).is_empty());
        assert!(Typeface::Builtin.rasterize("", 40.0).is_empty());
    }
}
