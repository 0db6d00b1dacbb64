//! Meeting protocol payloads

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{Validate, ValidationErrors};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateProtocol {
    pub title: String,
    pub protocol_date: NaiveDate,
    pub content: Option<String>,
    #[serde(default)]
    pub attendees: Vec<String>,
    #[serde(default)]
    pub decisions: Vec<String>,
    pub document_url: Option<String>,
    pub committee_id: Option<Uuid>,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

fn default_public() -> bool {
    true
}

impl Validate for CreateProtocol {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("title", &self.title, 200);
        errors.optional_text("content", self.content.as_deref(), 50_000);
        for attendee in &self.attendees {
            errors.require_text("attendees", attendee, 100);
        }
        for decision in &self.decisions {
            errors.require_text("decisions", decision, 1000);
        }
        errors.url("document_url", self.document_url.as_deref());
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateProtocol {
    pub title: Option<String>,
    pub protocol_date: Option<NaiveDate>,
    pub content: Option<String>,
    pub attendees: Option<Vec<String>>,
    pub decisions: Option<Vec<String>>,
    pub document_url: Option<String>,
    pub committee_id: Option<Uuid>,
    pub is_public: Option<bool>,
}

impl Validate for UpdateProtocol {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.non_blank("title", self.title.as_deref(), 200);
        errors.optional_text("content", self.content.as_deref(), 50_000);
        for attendee in self.attendees.iter().flatten() {
            errors.require_text("attendees", attendee, 100);
        }
        for decision in self.decisions.iter().flatten() {
            errors.require_text("decisions", decision, 1000);
        }
        errors.url("document_url", self.document_url.as_deref());
        errors.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn public_by_default() {
        let p: CreateProtocol = serde_json::from_value(json!({
            "title": "ישיבת ועד 3",
            "protocol_date": "2024-11-05"
        }))
        .unwrap();
        assert!(p.is_public);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn blank_decision_rejected() {
        let p: CreateProtocol = serde_json::from_value(json!({
            "title": "ישיבה",
            "protocol_date": "2024-11-05",
            "decisions": ["לאשר תקציב", " "]
        }))
        .unwrap();
        assert_eq!(p.validate().unwrap_err().len(), 1);
    }
}
