//! Static lookup tables: size presets, styles, prompt templates and caption
//! suggestions, loaded from a bundled JSON file and validated at startup.

use std::collections::HashSet;
use std::fmt;

use serde::Deserialize;

/// Placeholder replaced with the user's context, upper-cased.
const CONTEXT_UPPER: &str = "{CONTEXT}";
/// Placeholder replaced with the user's context as typed.
const CONTEXT_AS_TYPED: &str = "{context}";

/// Errors returned when loading the catalog.
#[derive(Debug)]
pub enum CatalogError {
    /// The JSON payload could not be parsed.
    Parse(serde_json::Error),
    /// The payload parsed but is incomplete or inconsistent.
    Invalid(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "Failed to parse catalog JSON: {err}"),
            Self::Invalid(reason) => write!(f, "Invalid catalog: {reason}"),
        }
    }
}

impl std::error::Error for CatalogError {}

/// A named output size.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct SizePreset {
    /// Display name, also the form value.
    pub name: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// When set, the user supplies the dimensions.
    #[serde(default)]
    pub custom: bool,
}

/// A visual style and the keywords appended to the prompt for it.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Style {
    /// Display name, also the form value.
    pub name: String,
    /// Keyword phrase sent to the generator.
    pub keywords: String,
}

/// Optional prompt booster toggled by a checkbox.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Enhancer {
    /// Form key.
    pub key: String,
    /// Checkbox label.
    pub label: String,
    /// Hover help.
    pub help: String,
    /// Appended to the prompt when checked.
    pub suffix: String,
}

/// A ready-made prompt.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Template {
    /// Display name.
    pub name: String,
    /// Prompt loaded into the form.
    pub prompt: String,
}

/// Templates grouped under a heading.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct TemplateCategory {
    /// Heading.
    pub name: String,
    /// Templates in display order.
    pub templates: Vec<Template>,
}

/// One caption idea, possibly mentioning the user's context.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Suggestion {
    /// Text with optional `{context}` or `{CONTEXT}` placeholders.
    pub text: String,
    /// Used in place of the context when the user left it blank.
    #[serde(default)]
    pub fallback: Option<String>,
}

impl Suggestion {
    fn has_placeholder(&self) -> bool {
        self.text.contains(CONTEXT_UPPER) || self.text.contains(CONTEXT_AS_TYPED)
    }

    /// Fills the placeholders.
    pub fn render(&self, context: &str) -> String {
        let context = context.trim();
        let fallback = self.fallback.as_deref().unwrap_or_default();
        let (upper, as_typed) = if context.is_empty() {
            (fallback.to_string(), fallback.to_string())
        } else {
            (context.to_uppercase(), context.to_string())
        };
        self.text
            .replace(CONTEXT_UPPER, &upper)
            .replace(CONTEXT_AS_TYPED, &as_typed)
    }
}

/// Suggestions for one kind of caption.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct CaptionType {
    /// Display name, also the form value.
    pub name: String,
    /// Suggestions in display order.
    pub suggestions: Vec<Suggestion>,
}

/// All static tables.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Catalog {
    /// Preset selected when the form first loads.
    pub default_size: String,
    /// Output sizes.
    pub sizes: Vec<SizePreset>,
    /// Visual styles.
    pub styles: Vec<Style>,
    /// What the user is making; only changes the hint shown.
    pub purposes: Vec<String>,
    /// Prompt boosters.
    pub enhancers: Vec<Enhancer>,
    /// Ready-made prompts.
    pub template_categories: Vec<TemplateCategory>,
    /// Caption ideas.
    pub caption_types: Vec<CaptionType>,
}

impl Catalog {
    /// Parses and validates the catalog shipped with the binary.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_json(include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/data/catalog.json"
        )))
    }

    /// Parses and validates a catalog.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(raw).map_err(CatalogError::Parse)?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let invalid = |reason: String| Err(CatalogError::Invalid(reason));

        if self.sizes.is_empty() {
            return invalid("no size presets".to_string());
        }
        for size in &self.sizes {
            if size.width == 0 || size.height == 0 {
                return invalid(format!("size preset {} has a zero dimension", size.name));
            }
        }
        if self.size(&self.default_size).is_none() {
            return invalid(format!("default size {} is not a preset", self.default_size));
        }
        if self.styles.is_empty() {
            return invalid("no styles".to_string());
        }
        for style in &self.styles {
            if style.keywords.trim().is_empty() {
                return invalid(format!("style {} has no keywords", style.name));
            }
        }
        if self.purposes.is_empty() {
            return invalid("no purposes".to_string());
        }
        for enhancer in &self.enhancers {
            if enhancer.suffix.trim().is_empty() {
                return invalid(format!("enhancer {} has no suffix", enhancer.key));
            }
        }
        for category in &self.template_categories {
            if category.templates.is_empty() {
                return invalid(format!("template category {} is empty", category.name));
            }
            for template in &category.templates {
                if template.prompt.trim().is_empty() {
                    return invalid(format!("template {} has no prompt", template.name));
                }
            }
        }
        for caption_type in &self.caption_types {
            if caption_type.suggestions.is_empty() {
                return invalid(format!("caption type {} has no suggestions", caption_type.name));
            }
            for suggestion in &caption_type.suggestions {
                if suggestion.has_placeholder() && suggestion.fallback.is_none() {
                    return invalid(format!(
                        "caption suggestion in {} uses the context without a fallback",
                        caption_type.name
                    ));
                }
            }
        }

        let names: [(&str, Vec<&str>); 3] = [
            ("size", self.sizes.iter().map(|s| s.name.as_str()).collect()),
            ("style", self.styles.iter().map(|s| s.name.as_str()).collect()),
            (
                "enhancer",
                self.enhancers.iter().map(|e| e.key.as_str()).collect(),
            ),
        ];
        for (kind, list) in names {
            let mut seen = HashSet::new();
            if let Some(duplicate) = list.into_iter().find(|name| !seen.insert(*name)) {
                return invalid(format!("duplicate {kind} {duplicate}"));
            }
        }
        Ok(())
    }

    /// Size preset by name.
    pub fn size(&self, name: &str) -> Option<&SizePreset> {
        self.sizes.iter().find(|size| size.name == name)
    }

    /// Keyword phrase for a style.
    pub fn style_keywords(&self, name: &str) -> Option<&str> {
        self.styles
            .iter()
            .find(|style| style.name == name)
            .map(|style| style.keywords.as_str())
    }

    /// Prompt booster by form key.
    pub fn enhancer(&self, key: &str) -> Option<&Enhancer> {
        self.enhancers.iter().find(|enhancer| enhancer.key == key)
    }

    /// Template by category and name.
    pub fn template(&self, category: &str, name: &str) -> Option<&Template> {
        self.template_categories
            .iter()
            .find(|candidate| candidate.name == category)?
            .templates
            .iter()
            .find(|template| template.name == name)
    }

    /// Every template, in display order.
    pub fn templates(&self) -> impl Iterator<Item = &Template> {
        self.template_categories
            .iter()
            .flat_map(|category| category.templates.iter())
    }

    /// Hint shown above the prompt box; the custom purpose gets none.
    pub fn purpose_tip(&self, purpose: &str) -> Option<String> {
        if purpose == "Custom" || !self.purposes.iter().any(|known| known == purpose) {
            return None;
        }
        Some(format!(
            "Tip for {purpose}: Be specific about the theme, colors, and mood you want!"
        ))
    }

    /// Rendered caption ideas for a caption type.
    pub fn caption_suggestions(&self, kind: &str, context: &str) -> Option<Vec<String>> {
        let caption_type = self
            .caption_types
            .iter()
            .find(|caption_type| caption_type.name == kind)?;
        Some(
            caption_type
                .suggestions
                .iter()
                .map(|suggestion| suggestion.render(context))
                .collect(),
        )
    }
}
