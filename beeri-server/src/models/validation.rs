//! Validation error types
//!
//! Request bodies are checked field by field; every failing field becomes
//! one entry in the `details` list of the 400 envelope.

use std::fmt;

use beeri_core::{FieldRule, Locale};
use chrono::{DateTime, Utc};

/// A single failed field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub rule: FieldRule,
}

impl ValidationError {
    pub fn new(field: &'static str, rule: FieldRule) -> Self {
        Self { field, rule }
    }

    /// Render as `field: message` in the given locale.
    pub fn localized(&self, locale: Locale) -> String {
        format!("{}: {}", self.field, self.rule.text(locale))
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", self.field, self.rule)
    }
}

impl std::error::Error for ValidationError {}

/// Collected validation failures for one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, rule: FieldRule) -> Self {
        Self(vec![ValidationError::new(field, rule)])
    }

    pub fn push(&mut self, field: &'static str, rule: FieldRule) {
        self.0.push(ValidationError::new(field, rule));
    }

    /// Non-empty after trimming, at most `max` characters.
    pub fn require_text(&mut self, field: &'static str, value: &str, max: usize) {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.push(field, FieldRule::Required);
        } else if trimmed.chars().count() > max {
            self.push(field, FieldRule::TooLong { max });
        }
    }

    /// Length check only when the value is present.
    pub fn optional_text(&mut self, field: &'static str, value: Option<&str>, max: usize) {
        if let Some(v) = value {
            if v.chars().count() > max {
                self.push(field, FieldRule::TooLong { max });
            }
        }
    }

    /// A present value must not be blank.
    pub fn non_blank(&mut self, field: &'static str, value: Option<&str>, max: usize) {
        if let Some(v) = value {
            self.require_text(field, v, max);
        }
    }

    pub fn range(&mut self, field: &'static str, value: i64, min: i64, max: i64) {
        if value < min || value > max {
            self.push(field, FieldRule::OutOfRange { min, max });
        }
    }

    pub fn non_negative(&mut self, field: &'static str, value: Option<f64>) {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                self.push(field, FieldRule::OutOfRange { min: 0, max: i64::MAX });
            }
        }
    }

    pub fn time_order(
        &mut self,
        field: &'static str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) {
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                self.push(field, FieldRule::EndsBeforeStart);
            }
        }
    }

    /// `http(s)://` URL or site-relative path.
    pub fn url(&mut self, field: &'static str, value: Option<&str>) {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            let ok = v.starts_with("https://") || v.starts_with("http://") || v.starts_with('/');
            if !ok || v.chars().any(char::is_whitespace) {
                self.push(field, FieldRule::InvalidFormat);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn messages(&self, locale: Locale) -> Vec<String> {
        self.0.iter().map(|e| e.localized(locale)).collect()
    }

    /// `Ok(())` when nothing failed.
    pub fn finish(self) -> Result<(), Self> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationError> for ValidationErrors {
    fn from(e: ValidationError) -> Self {
        Self(vec![e])
    }
}

/// Request bodies that can check themselves
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_multiple_fields() {
        let mut errors = ValidationErrors::new();
        errors.require_text("title", "   ", 10);
        errors.require_text("location", "a very long location", 5);
        errors.range("rating", 7, 1, 5);

        assert_eq!(errors.len(), 3);
        let messages = errors.messages(Locale::He);
        assert_eq!(messages[0], "title: שדה חובה");
        assert!(messages[1].starts_with("location:"));
    }

    #[test]
    fn counts_characters_not_bytes() {
        // 5 Hebrew letters are 10 bytes
        let mut errors = ValidationErrors::new();
        errors.require_text("name", "שלום!", 5);
        assert!(errors.is_empty());
    }

    #[test]
    fn time_order_checks_pairs_only() {
        let now = Utc::now();
        let mut errors = ValidationErrors::new();
        errors.time_order("end_datetime", Some(now), None);
        errors.time_order("end_datetime", Some(now), Some(now));
        assert!(errors.is_empty());

        errors.time_order("end_datetime", Some(now), Some(now - chrono::Duration::hours(1)));
        assert_eq!(errors.errors()[0].rule, FieldRule::EndsBeforeStart);
    }

    #[test]
    fn url_rules() {
        let mut errors = ValidationErrors::new();
        errors.url("cta_link", Some("https://example.org/x"));
        errors.url("cta_link", Some("/events"));
        errors.url("cta_link", None);
        assert!(errors.is_empty());

        errors.url("cta_link", Some("javascript:alert(1)"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn finish_returns_errors() {
        assert!(ValidationErrors::new().finish().is_ok());
        let err = ValidationErrors::single("name", FieldRule::Required)
            .finish()
            .unwrap_err();
        assert_eq!(err.len(), 1);
    }
}
