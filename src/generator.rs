//! Client for the remote text-to-image endpoint.

use std::fmt;
use std::time::Duration;

use image::RgbaImage;
use reqwest::StatusCode;
use tracing::{debug, info, instrument};
use url::Url;

/// Why a generation call produced no image.
#[derive(Debug)]
pub enum GenerationFailure {
    /// The endpoint could not be turned into a request URL.
    Endpoint(String),
    /// The request did not finish within the client timeout.
    Timeout,
    /// The request failed before a response arrived.
    Transport(reqwest::Error),
    /// The endpoint answered with a non-success status.
    Status(StatusCode),
    /// The body was not a decodable raster image.
    Decode(image::ImageError),
}

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Endpoint(reason) => write!(f, "Invalid generator endpoint: {reason}"),
            Self::Timeout => write!(f, "The image service took too long to respond"),
            Self::Transport(err) => write!(f, "Could not reach the image service: {err}"),
            Self::Status(status) => write!(f, "The image service returned {status}"),
            Self::Decode(err) => write!(f, "The image service sent an unreadable image: {err}"),
        }
    }
}

impl std::error::Error for GenerationFailure {}

impl From<reqwest::Error> for GenerationFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GenerationFailure::Timeout
        } else {
            GenerationFailure::Transport(err)
        }
    }
}

/// Builds the prompt sent to the generator: the user's prompt followed by
/// the style's keyword phrase.
pub fn styled_prompt(prompt: &str, style_keywords: &str) -> String {
    match style_keywords.trim() {
        "" => prompt.trim().to_string(),
        keywords => format!("{}, {}", prompt.trim(), keywords),
    }
}

/// Fetches images from a pollinations-style endpoint, where the prompt is
/// the last path segment and the size goes in the query.
#[derive(Clone, Debug)]
pub struct ImageGenerator {
    client: reqwest::Client,
    endpoint: Url,
}

impl ImageGenerator {
    /// Creates a client with the given per-request timeout.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, GenerationFailure> {
        let endpoint =
            Url::parse(endpoint).map_err(|err| GenerationFailure::Endpoint(err.to_string()))?;
        if endpoint.cannot_be_a_base() {
            return Err(GenerationFailure::Endpoint(format!(
                "{endpoint} cannot take a prompt path"
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(GenerationFailure::Transport)?;
        Ok(Self { client, endpoint })
    }

    /// Request URL for a prompt and size.
    pub fn request_url(
        &self,
        prompt: &str,
        width: u32,
        height: u32,
    ) -> Result<Url, GenerationFailure> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| GenerationFailure::Endpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .push(prompt);
        url.query_pairs_mut()
            .append_pair("width", &width.to_string())
            .append_pair("height", &height.to_string())
            .append_pair("nologo", "true")
            .append_pair("enhance", "true");
        Ok(url)
    }

    /// Generates one image. Any failure, including a body that does not
    /// decode, is reported as a [`GenerationFailure`]; nothing is retried.
    #[instrument(skip(self, prompt, style_keywords))]
    pub async fn fetch(
        &self,
        prompt: &str,
        width: u32,
        height: u32,
        style_keywords: &str,
    ) -> Result<RgbaImage, GenerationFailure> {
        let full_prompt = styled_prompt(prompt, style_keywords);
        let url = self.request_url(&full_prompt, width, height)?;
        debug!("Requesting image from {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            info!("Image service returned {}", status);
            return Err(GenerationFailure::Status(status));
        }
        let bytes = response.bytes().await?;
        let image = image::load_from_memory(&bytes).map_err(GenerationFailure::Decode)?;
        debug!(
            "Decoded generated image {}x{}",
            image.width(),
            image.height()
        );
        Ok(image.to_rgba8())
    }
}
