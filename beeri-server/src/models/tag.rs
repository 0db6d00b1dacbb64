//! Tag payloads

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::validation::{Validate, ValidationErrors};
use beeri_core::FieldRule;

const MAX_TAG_NAME_LEN: usize = 50;

/// `#rgb` or `#rrggbb`
static COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("invalid color regex"));

/// POST /api/tags
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateTag {
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
    pub emoji: Option<String>,
}

fn default_color() -> String {
    "#6366f1".to_string()
}

impl CreateTag {
    /// Names are compared as stored, so trim once here.
    pub fn normalized_name(&self) -> &str {
        self.name.trim()
    }
}

impl Validate for CreateTag {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("name", &self.name, MAX_TAG_NAME_LEN);
        validate_color(&mut errors, Some(&self.color));
        errors.optional_text("emoji", self.emoji.as_deref(), 8);
        errors.finish()
    }
}

/// PUT /api/tags/{id}
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateTag {
    pub name: Option<String>,
    pub color: Option<String>,
    pub emoji: Option<String>,
}

impl Validate for UpdateTag {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.non_blank("name", self.name.as_deref(), MAX_TAG_NAME_LEN);
        validate_color(&mut errors, self.color.as_deref());
        errors.optional_text("emoji", self.emoji.as_deref(), 8);
        errors.finish()
    }
}

pub(crate) fn validate_color(errors: &mut ValidationErrors, value: Option<&str>) {
    if let Some(color) = value {
        if !COLOR_RE.is_match(color) {
            errors.push("color", FieldRule::InvalidFormat);
        }
    }
}
