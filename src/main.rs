use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use poster_studio::catalog::Catalog;
use poster_studio::config::setup_logging;
use poster_studio::constants::{DEFAULT_BOLD_FONTS, DEFAULT_REGULAR_FONTS};
use poster_studio::fonts::FontBook;
use poster_studio::generator::ImageGenerator;
use tracing::error;

/// Configured font first, then the system defaults.
fn font_candidates(configured: Option<PathBuf>, defaults: &[&str]) -> Vec<PathBuf> {
    configured
        .into_iter()
        .chain(defaults.iter().map(PathBuf::from))
        .collect()
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = poster_studio::cli::CliOptions::parse();

    if setup_logging(cli.debug).is_err() {
        return;
    }

    let catalog = match Catalog::bundled() {
        Ok(catalog) => catalog,
        Err(err) => {
            error!("Catalog error: {}", err);
            return;
        }
    };

    let fonts = FontBook::resolve(
        &font_candidates(cli.font_bold, DEFAULT_BOLD_FONTS),
        &font_candidates(cli.font_regular, DEFAULT_REGULAR_FONTS),
    );

    let generator = match ImageGenerator::new(
        &cli.generator_url,
        Duration::from_secs(cli.generator_timeout),
    ) {
        Ok(generator) => generator,
        Err(err) => {
            error!("Generator setup error: {}", err);
            return;
        }
    };

    if let Err(err) = poster_studio::web::setup_server(
        &cli.listen_address,
        cli.port,
        catalog,
        fonts,
        generator,
    )
    .await
    {
        error!("Application error: {}", err);
    }
}
