//! Caption a local image without the web front end.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use poster_studio::compositor::{CompositionRequest, TextStyle, VerticalAnchor};
use poster_studio::config::setup_logging;
use poster_studio::constants::{
    DEFAULT_BOLD_FONTS, DEFAULT_REGULAR_FONTS, DEFAULT_TEXT_SIZE, TEXT_SIZE_RANGE,
};
use poster_studio::design::{Captions, parse_colour};
use poster_studio::effects::Adjustments;
use poster_studio::export::ExportFormat;
use poster_studio::fonts::FontBook;
use std::num::NonZeroU32;
use std::path::PathBuf;
use tracing::info;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Position {
    Top,
    Center,
    Bottom,
    TopAndBottom,
    None,
}

impl From<Position> for VerticalAnchor {
    fn from(position: Position) -> Self {
        match position {
            Position::Top => VerticalAnchor::Top,
            Position::Center => VerticalAnchor::Center,
            Position::Bottom => VerticalAnchor::Bottom,
            Position::TopAndBottom => VerticalAnchor::TopAndBottom,
            Position::None => VerticalAnchor::None,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Png,
    Jpg,
    Web,
    Whatsapp,
}

impl From<Format> for ExportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Png => ExportFormat::Png,
            Format::Jpg => ExportFormat::Jpeg,
            Format::Web => ExportFormat::Web,
            Format::Whatsapp => ExportFormat::WhatsApp,
        }
    }
}

/// Overlay outlined captions on an image file.
///
///   compose_caption photo.jpg poster.png --main-text "TECH FEST"
#[derive(Parser, Debug)]
#[command(name = "compose_caption")]
struct Args {
    /// Image to caption
    input: PathBuf,

    /// Where to write the result
    output: PathBuf,

    /// Headline, drawn at the full text size
    #[arg(long, default_value = "")]
    main_text: String,

    /// Secondary line
    #[arg(long, default_value = "")]
    subtext: String,

    /// Bottom band caption
    #[arg(long, default_value = "")]
    bottom_text: String,

    /// Contact line
    #[arg(long, default_value = "")]
    contact_info: String,

    #[arg(long, value_enum, default_value_t = Position::Top)]
    position: Position,

    /// Headline size in pixels
    #[arg(long, default_value_t = DEFAULT_TEXT_SIZE)]
    text_size: u32,

    #[arg(long, default_value = "#FFFFFF")]
    text_color: String,

    #[arg(long, default_value = "#000000")]
    outline_color: String,

    #[arg(long, default_value_t = 1.0)]
    brightness: f32,

    #[arg(long, default_value_t = 1.0)]
    contrast: f32,

    #[arg(long, default_value_t = 1.0)]
    saturation: f32,

    #[arg(long, value_enum, default_value_t = Format::Png)]
    format: Format,

    #[arg(long, env = "STUDIO_FONT_BOLD")]
    font_bold: Option<PathBuf>,

    #[arg(long, env = "STUDIO_FONT_REGULAR")]
    font_regular: Option<PathBuf>,

    #[arg(long)]
    debug: bool,
}

fn candidates(configured: Option<PathBuf>, defaults: &[&str]) -> Vec<PathBuf> {
    configured
        .into_iter()
        .chain(defaults.iter().map(PathBuf::from))
        .collect()
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.debug).map_err(|err| anyhow!("logging: {err}"))?;

    if !TEXT_SIZE_RANGE.contains(&args.text_size) {
        anyhow::bail!(
            "--text-size must be between {} and {}",
            TEXT_SIZE_RANGE.start(),
            TEXT_SIZE_RANGE.end()
        );
    }
    let base_size = NonZeroU32::new(args.text_size).ok_or_else(|| anyhow!("zero text size"))?;
    let style = TextStyle {
        base_size,
        text_color: parse_colour("--text-color", &args.text_color).map_err(|err| anyhow!(err))?,
        outline_color: parse_colour("--outline-color", &args.outline_color)
            .map_err(|err| anyhow!(err))?,
    };

    let image = image::open(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?
        .to_rgba8();

    let fonts = FontBook::resolve(
        &candidates(args.font_bold, DEFAULT_BOLD_FONTS),
        &candidates(args.font_regular, DEFAULT_REGULAR_FONTS),
    );

    let captions = Captions {
        headline: args.main_text.trim().to_string(),
        subtitle: args.subtext.trim().to_string(),
        bottom_text: args.bottom_text.trim().to_string(),
        contact: args.contact_info.trim().to_string(),
    };
    let vertical_anchor = VerticalAnchor::from(args.position);
    let request = CompositionRequest {
        entries: captions.entries(vertical_anchor),
        vertical_anchor,
        style,
    };

    let adjusted = Adjustments {
        brightness: args.brightness,
        contrast: args.contrast,
        saturation: args.saturation,
    }
    .apply(&image);
    let finished = request.render(&adjusted, &fonts);

    let format = ExportFormat::from(args.format);
    let bytes = format.encode(&finished)?;
    std::fs::write(&args.output, &bytes)
        .with_context(|| format!("writing {}", args.output.display()))?;
    info!(
        "Wrote {} ({} bytes, {} captions)",
        args.output.display(),
        bytes.len(),
        request.entries.len()
    );
    Ok(())
}
