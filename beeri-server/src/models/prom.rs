//! Prom planning payloads: the prom event, vendor quotes, parent votes and
//! the budget.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::validation::{Validate, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromStatus {
    #[default]
    Planning,
    Voting,
    Booked,
    Completed,
}

impl PromStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Voting => "voting",
            Self::Booked => "booked",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreatePromEvent {
    pub title: String,
    pub event_date: Option<NaiveDate>,
    pub venue: Option<String>,
    pub description: Option<String>,
    pub budget_total: Option<f64>,
    pub student_count: Option<i32>,
    #[serde(default)]
    pub status: PromStatus,
    #[serde(default)]
    pub voting_enabled: bool,
    pub voting_ends_at: Option<DateTime<Utc>>,
}

impl Validate for CreatePromEvent {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("title", &self.title, 200);
        errors.optional_text("venue", self.venue.as_deref(), 200);
        errors.optional_text("description", self.description.as_deref(), 5000);
        errors.non_negative("budget_total", self.budget_total);
        if let Some(count) = self.student_count {
            errors.range("student_count", count.into(), 1, 2000);
        }
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdatePromEvent {
    pub title: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub venue: Option<String>,
    pub description: Option<String>,
    pub budget_total: Option<f64>,
    pub student_count: Option<i32>,
    pub status: Option<PromStatus>,
    pub voting_enabled: Option<bool>,
    pub voting_ends_at: Option<DateTime<Utc>>,
}

impl Validate for UpdatePromEvent {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.non_blank("title", self.title.as_deref(), 200);
        errors.optional_text("venue", self.venue.as_deref(), 200);
        errors.optional_text("description", self.description.as_deref(), 5000);
        errors.non_negative("budget_total", self.budget_total);
        if let Some(count) = self.student_count {
            errors.range("student_count", count.into(), 1, 2000);
        }
        errors.finish()
    }
}

/// POST /api/prom/{id}/quotes
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateQuote {
    pub category: String,
    pub vendor_name: String,
    pub vendor_id: Option<Uuid>,
    pub price_total: Option<f64>,
    pub price_per_student: Option<f64>,
    pub description: Option<String>,
    pub contact_info: Option<String>,
    pub document_url: Option<String>,
    #[serde(default)]
    pub is_finalist: bool,
}

impl Validate for CreateQuote {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("category", &self.category, 50);
        errors.require_text("vendor_name", &self.vendor_name, 150);
        errors.non_negative("price_total", self.price_total);
        errors.non_negative("price_per_student", self.price_per_student);
        errors.optional_text("description", self.description.as_deref(), 5000);
        errors.optional_text("contact_info", self.contact_info.as_deref(), 300);
        errors.url("document_url", self.document_url.as_deref());
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateQuote {
    pub category: Option<String>,
    pub vendor_name: Option<String>,
    pub price_total: Option<f64>,
    pub price_per_student: Option<f64>,
    pub description: Option<String>,
    pub contact_info: Option<String>,
    pub document_url: Option<String>,
    pub is_selected: Option<bool>,
}

impl Validate for UpdateQuote {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.non_blank("category", self.category.as_deref(), 50);
        errors.non_blank("vendor_name", self.vendor_name.as_deref(), 150);
        errors.non_negative("price_total", self.price_total);
        errors.non_negative("price_per_student", self.price_per_student);
        errors.optional_text("description", self.description.as_deref(), 5000);
        errors.optional_text("contact_info", self.contact_info.as_deref(), 300);
        errors.url("document_url", self.document_url.as_deref());
        errors.finish()
    }
}

/// PATCH /api/prom/{id}/quotes/{quote_id}/finalist
#[derive(Debug, Clone, Deserialize)]
pub struct SetFinalist {
    pub is_finalist: bool,
}

impl Validate for SetFinalist {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

/// POST /api/prom/{id}/votes
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CastVote {
    pub quote_id: Uuid,
    /// Any stable per-parent identifier (device id, phone). Never stored raw.
    pub voter_id: String,
    pub rating: i16,
    pub comment: Option<String>,
}

impl Validate for CastVote {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("voter_id", &self.voter_id, 200);
        errors.range("rating", self.rating.into(), 1, 5);
        errors.optional_text("comment", self.comment.as_deref(), 1000);
        errors.finish()
    }
}

/// Query string for GET /api/prom/{id}/votes/mine
#[derive(Debug, Clone, Deserialize)]
pub struct VoterQuery {
    pub voter_id: String,
}

/// Pseudonymous voter key: SHA-256 over salt, prom id and the raw identifier.
///
/// Scoping by prom id means the same parent gets unrelated hashes in
/// different prom events.
pub fn hash_voter(salt: &str, prom_id: Uuid, voter_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(prom_id.as_bytes());
    hasher.update(b":");
    hasher.update(voter_id.trim().to_lowercase().as_bytes());
    hex::encode(hasher.finalize())
}

/// Votes are accepted only while enabled and before the deadline.
pub fn voting_open(
    voting_enabled: bool,
    voting_ends_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    voting_enabled && voting_ends_at.map_or(true, |ends| now < ends)
}

/// POST /api/prom/{id}/budget
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateBudgetItem {
    pub category: String,
    pub description: Option<String>,
    pub estimated_amount: f64,
    pub actual_amount: Option<f64>,
    #[serde(default)]
    pub is_paid: bool,
    pub quote_id: Option<Uuid>,
}

impl Validate for CreateBudgetItem {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("category", &self.category, 50);
        errors.optional_text("description", self.description.as_deref(), 1000);
        errors.non_negative("estimated_amount", Some(self.estimated_amount));
        errors.non_negative("actual_amount", self.actual_amount);
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateBudgetItem {
    pub category: Option<String>,
    pub description: Option<String>,
    pub estimated_amount: Option<f64>,
    pub actual_amount: Option<f64>,
    pub is_paid: Option<bool>,
}

impl Validate for UpdateBudgetItem {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.non_blank("category", self.category.as_deref(), 50);
        errors.optional_text("description", self.description.as_deref(), 1000);
        errors.non_negative("estimated_amount", self.estimated_amount);
        errors.non_negative("actual_amount", self.actual_amount);
        errors.finish()
    }
}
