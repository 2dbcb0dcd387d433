//! CLI parser
use clap::Parser;
use std::num::NonZeroU16;
use std::path::PathBuf;

use crate::constants::{DEFAULT_GENERATOR_TIMEOUT_SECONDS, DEFAULT_GENERATOR_URL};

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "STUDIO_DEBUG")]
    /// Enable debug logging. Env: STUDIO_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "9000", env = "STUDIO_PORT")]
    /// http listener, defaults to `9000`.
    /// Env: STUDIO_PORT
    pub port: NonZeroU16,
    #[clap(
        long,
        short,
        default_value = "127.0.0.1",
        env = "STUDIO_LISTEN_ADDRESS"
    )]
    /// Listen address, defaults to `127.0.0.1`.
    /// Env: STUDIO_LISTEN_ADDRESS
    pub listen_address: String,

    #[clap(long, default_value = DEFAULT_GENERATOR_URL, env = "STUDIO_GENERATOR_URL")]
    /// Text-to-image endpoint; the prompt is appended as a path segment.
    /// Env: STUDIO_GENERATOR_URL
    pub generator_url: String,

    #[clap(long, default_value_t = DEFAULT_GENERATOR_TIMEOUT_SECONDS, env = "STUDIO_GENERATOR_TIMEOUT")]
    /// Seconds to wait for the generator before giving up.
    /// Env: STUDIO_GENERATOR_TIMEOUT
    pub generator_timeout: u64,

    #[clap(long, env = "STUDIO_FONT_BOLD")]
    /// Font used for headlines, tried before the system defaults.
    /// Env: STUDIO_FONT_BOLD
    pub font_bold: Option<PathBuf>,

    #[clap(long, env = "STUDIO_FONT_REGULAR")]
    /// Font used for subtitles and details, tried before the system defaults.
    /// Env: STUDIO_FONT_REGULAR
    pub font_regular: Option<PathBuf>,
}
