//! Turning a submitted form into a finished design.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::LazyLock;

use image::{Rgba, RgbaImage};
use regex::Regex;
use serde::Deserialize;

use crate::catalog::Catalog;
use crate::compositor::{Anchor, CompositionRequest, Emphasis, TextEntry, TextStyle, VerticalAnchor};
use crate::constants::{CUSTOM_DIMENSION_RANGE, DEFAULT_TEXT_SIZE, EFFECT_RANGE, TEXT_SIZE_RANGE};
use crate::effects::Adjustments;
use crate::fonts::FontBook;

/// Message shown when the prompt box is left blank.
pub const EMPTY_PROMPT_MESSAGE: &str = "Please describe what you want to create!";

/// Form field prefix for prompt enhancer checkboxes.
pub const ENHANCER_FIELD_PREFIX: &str = "enhance_";

#[allow(clippy::expect_used)]
static HEX_COLOUR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})$")
        .expect("colour pattern compiles")
});

/// Raw values from the create form. Everything arrives as text so that bad
/// input becomes a message on the form rather than a rejected request.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct DesignForm {
    pub(crate) csrf_token: String,
    /// What to generate.
    pub prompt: String,
    /// Purpose picked from the catalog.
    pub purpose: String,
    /// Size preset name.
    pub size: String,
    /// Custom width, used with the custom preset.
    pub width: String,
    /// Custom height, used with the custom preset.
    pub height: String,
    /// Style name.
    pub style: String,
    /// Text position, one of the [`VerticalAnchor`] form values.
    pub position: String,
    /// Caption size in pixels.
    pub text_size: String,
    /// Caption fill colour as `#RRGGBB`.
    pub text_color: String,
    /// Caption outline colour as `#RRGGBB`.
    pub outline_color: String,
    /// Checkbox enabling the effect sliders.
    pub effects: Option<String>,
    /// Brightness multiplier.
    pub brightness: String,
    /// Contrast multiplier.
    pub contrast: String,
    /// Saturation multiplier.
    pub saturation: String,
    /// Headline caption.
    pub main_text: String,
    /// Secondary caption.
    pub subtext: String,
    /// Caption for the bottom band.
    pub bottom_text: String,
    /// Contact line.
    pub contact_info: String,
    /// Anything else, notably the `enhance_<key>` checkboxes.
    #[serde(flatten)]
    pub extra: HashMap<String, String>,
}

impl Default for DesignForm {
    fn default() -> Self {
        Self {
            csrf_token: String::new(),
            prompt: String::new(),
            purpose: String::new(),
            size: String::new(),
            width: "1024".to_string(),
            height: "1024".to_string(),
            style: String::new(),
            position: VerticalAnchor::Top.value().to_string(),
            text_size: DEFAULT_TEXT_SIZE.to_string(),
            text_color: "#FFFFFF".to_string(),
            outline_color: "#000000".to_string(),
            effects: None,
            brightness: "1.0".to_string(),
            contrast: "1.0".to_string(),
            saturation: "1.0".to_string(),
            main_text: String::new(),
            subtext: String::new(),
            bottom_text: String::new(),
            contact_info: String::new(),
            extra: HashMap::new(),
        }
    }
}

impl DesignForm {
    /// A blank form using the catalog's first purpose, default size and
    /// first style.
    pub fn for_catalog(catalog: &Catalog) -> Self {
        Self {
            purpose: catalog.purposes.first().cloned().unwrap_or_default(),
            size: catalog.default_size.clone(),
            style: catalog
                .styles
                .first()
                .map(|style| style.name.clone())
                .unwrap_or_default(),
            ..Self::default()
        }
    }

    /// The CSRF token that came with the submission.
    pub fn csrf_token(&self) -> &str {
        &self.csrf_token
    }

    /// True when the enhancer checkbox for `key` was ticked.
    pub fn enhancer_selected(&self, key: &str) -> bool {
        self.extra
            .contains_key(&format!("{ENHANCER_FIELD_PREFIX}{key}"))
    }

    /// Checks every field against the catalog and the allowed ranges.
    pub fn validate(&self, catalog: &Catalog) -> Result<DesignRequest, String> {
        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return Err(EMPTY_PROMPT_MESSAGE.to_string());
        }

        let preset = catalog
            .size(&self.size)
            .ok_or_else(|| format!("Unknown size preset: {}", self.size))?;
        let (width, height) = if preset.custom {
            (
                parse_dimension("Width", &self.width)?,
                parse_dimension("Height", &self.height)?,
            )
        } else {
            (preset.width, preset.height)
        };

        let style_keywords = catalog
            .style_keywords(&self.style)
            .ok_or_else(|| format!("Unknown style: {}", self.style))?
            .to_string();

        if !catalog.purposes.iter().any(|purpose| *purpose == self.purpose) {
            return Err(format!("Unknown purpose: {}", self.purpose));
        }

        let vertical_anchor = VerticalAnchor::ALL
            .into_iter()
            .find(|anchor| anchor.value() == self.position)
            .ok_or_else(|| format!("Unknown text position: {}", self.position))?;

        let base_size = self
            .text_size
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|size| TEXT_SIZE_RANGE.contains(size))
            .and_then(NonZeroU32::new)
            .ok_or_else(|| {
                format!(
                    "Text size must be between {} and {}",
                    TEXT_SIZE_RANGE.start(),
                    TEXT_SIZE_RANGE.end()
                )
            })?;
        let style = TextStyle {
            base_size,
            text_color: parse_colour("Text color", &self.text_color)?,
            outline_color: parse_colour("Outline color", &self.outline_color)?,
        };

        let adjustments = match self.effects {
            Some(_) => Some(Adjustments {
                brightness: parse_factor("Brightness", &self.brightness)?,
                contrast: parse_factor("Contrast", &self.contrast)?,
                saturation: parse_factor("Saturation", &self.saturation)?,
            }),
            None => None,
        };

        let enhancers: Vec<String> = catalog
            .enhancers
            .iter()
            .filter(|enhancer| self.enhancer_selected(&enhancer.key))
            .map(|enhancer| enhancer.key.clone())
            .collect();
        let full_prompt = build_prompt(catalog, prompt, &enhancers);

        let captions = Captions {
            headline: self.main_text.trim().to_string(),
            subtitle: self.subtext.trim().to_string(),
            bottom_text: self.bottom_text.trim().to_string(),
            contact: self.contact_info.trim().to_string(),
        };

        Ok(DesignRequest {
            prompt: prompt.to_string(),
            full_prompt,
            style_name: self.style.clone(),
            style_keywords,
            width,
            height,
            adjustments,
            composition: CompositionRequest {
                entries: captions.entries(vertical_anchor),
                vertical_anchor,
                style,
            },
            captions,
            form: self.clone(),
        })
    }
}

fn parse_dimension(label: &str, value: &str) -> Result<u32, String> {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|value| CUSTOM_DIMENSION_RANGE.contains(value))
        .ok_or_else(|| {
            format!(
                "{label} must be between {} and {}",
                CUSTOM_DIMENSION_RANGE.start(),
                CUSTOM_DIMENSION_RANGE.end()
            )
        })
}

fn parse_factor(label: &str, value: &str) -> Result<f32, String> {
    value
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|value| EFFECT_RANGE.contains(value))
        .ok_or_else(|| {
            format!(
                "{label} must be between {} and {}",
                EFFECT_RANGE.start(),
                EFFECT_RANGE.end()
            )
        })
}

/// Parses `#RRGGBB` into an opaque colour.
pub fn parse_colour(label: &str, value: &str) -> Result<Rgba<u8>, String> {
    let invalid = || format!("{label} must look like #RRGGBB");
    let captures = HEX_COLOUR.captures(value.trim()).ok_or_else(invalid)?;
    let mut rgb = [0u8; 3];
    for (channel, slot) in rgb.iter_mut().enumerate() {
        let digits = captures
            .get(channel + 1)
            .map(|found| found.as_str())
            .ok_or_else(invalid)?;
        *slot = u8::from_str_radix(digits, 16).map_err(|_| invalid())?;
    }
    Ok(Rgba([rgb[0], rgb[1], rgb[2], 255]))
}

/// The user's prompt followed by the suffix of each enhancer key, in the
/// order given. Unknown keys are ignored.
pub fn build_prompt(catalog: &Catalog, prompt: &str, enhancers: &[String]) -> String {
    enhancers
        .iter()
        .filter_map(|key| catalog.enhancer(key))
        .fold(prompt.trim().to_string(), |mut full, enhancer| {
            full.push_str(&enhancer.suffix);
            full
        })
}

/// Caption text from the form, trimmed.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Captions {
    /// Drawn at the primary size.
    pub headline: String,
    /// Secondary line under the headline.
    pub subtitle: String,
    /// Only shown by positions that use the bottom band.
    pub bottom_text: String,
    /// Contact details, always last.
    pub contact: String,
}

impl Captions {
    /// Compositor entries for a text position. Blank captions are dropped.
    pub fn entries(&self, position: VerticalAnchor) -> Vec<TextEntry> {
        use Emphasis::{Primary, Secondary};

        let planned: Vec<(&str, Emphasis, Anchor)> = match position {
            VerticalAnchor::Top => vec![
                (self.headline.as_str(), Primary, Anchor::Top),
                (self.subtitle.as_str(), Secondary, Anchor::Top),
                (self.contact.as_str(), Secondary, Anchor::Top),
            ],
            // the headline leads the centred block as well
            VerticalAnchor::Center => vec![
                (self.headline.as_str(), Primary, Anchor::Center),
                (self.subtitle.as_str(), Secondary, Anchor::Center),
                (self.contact.as_str(), Secondary, Anchor::Center),
            ],
            VerticalAnchor::Bottom => vec![
                (self.subtitle.as_str(), Secondary, Anchor::Bottom),
                (self.bottom_text.as_str(), Secondary, Anchor::Bottom),
                (self.contact.as_str(), Secondary, Anchor::Bottom),
            ],
            VerticalAnchor::TopAndBottom => vec![
                (self.headline.as_str(), Primary, Anchor::Top),
                (self.subtitle.as_str(), Secondary, Anchor::Top),
                (self.bottom_text.as_str(), Secondary, Anchor::Bottom),
                (self.contact.as_str(), Secondary, Anchor::Bottom),
            ],
            VerticalAnchor::None => Vec::new(),
        };

        planned
            .into_iter()
            .filter(|(content, _, _)| !content.trim().is_empty())
            .map(|(content, emphasis, target)| TextEntry::new(content, emphasis, target))
            .collect()
    }
}

/// A validated design: everything needed to generate, or regenerate, an
/// image.
#[derive(Clone, Debug, PartialEq)]
pub struct DesignRequest {
    /// Prompt as the user typed it.
    pub prompt: String,
    /// Prompt with enhancer suffixes, sent to the generator.
    pub full_prompt: String,
    /// Style name.
    pub style_name: String,
    /// Style keyword phrase, appended by the generator client.
    pub style_keywords: String,
    /// Output width.
    pub width: u32,
    /// Output height.
    pub height: u32,
    /// Effects, when enabled.
    pub adjustments: Option<Adjustments>,
    /// Caption layout.
    pub composition: CompositionRequest,
    /// Caption text as submitted.
    pub captions: Captions,
    /// The form this request came from, used to prefill the next one.
    pub form: DesignForm,
}

impl DesignRequest {
    /// Runs effects and then captions over a generated image.
    pub fn finish(&self, image: &RgbaImage, fonts: &FontBook) -> RgbaImage {
        let adjusted = match &self.adjustments {
            Some(adjustments) => adjustments.apply(image),
            None => image.clone(),
        };
        self.composition.render(&adjusted, fonts)
    }
}
