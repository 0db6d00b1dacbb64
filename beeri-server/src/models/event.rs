//! Event payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{Validate, ValidationErrors};

const MAX_TITLE_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 5000;
const MAX_LOCATION_LEN: usize = 300;

/// Publication state of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Draft,
    Published,
    Cancelled,
    Completed,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

/// Who can see an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

/// POST /api/events
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateEvent {
    pub title: String,
    pub description: Option<String>,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: Option<DateTime<Utc>>,
    pub location: Option<String>,
    #[serde(default = "default_event_type")]
    pub event_type: String,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub visibility: Visibility,
    pub committee_id: Option<Uuid>,
    pub budget_allocated: Option<f64>,
    pub max_attendees: Option<i32>,
    pub registration_enabled: Option<bool>,
}

fn default_event_type() -> String {
    "general".to_string()
}

impl Validate for CreateEvent {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("title", &self.title, MAX_TITLE_LEN);
        errors.optional_text("description", self.description.as_deref(), MAX_DESCRIPTION_LEN);
        errors.optional_text("location", self.location.as_deref(), MAX_LOCATION_LEN);
        errors.require_text("event_type", &self.event_type, 50);
        errors.time_order("end_datetime", Some(self.start_datetime), self.end_datetime);
        errors.non_negative("budget_allocated", self.budget_allocated);
        if let Some(max) = self.max_attendees {
            errors.range("max_attendees", max.into(), 1, 100_000);
        }
        errors.finish()
    }
}

/// PUT /api/events/{id} - absent fields keep their value
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateEvent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_datetime: Option<DateTime<Utc>>,
    pub end_datetime: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub event_type: Option<String>,
    pub status: Option<EventStatus>,
    pub visibility: Option<Visibility>,
    pub committee_id: Option<Uuid>,
    pub budget_allocated: Option<f64>,
    pub budget_spent: Option<f64>,
    pub max_attendees: Option<i32>,
    pub registration_enabled: Option<bool>,
}

impl Validate for UpdateEvent {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.non_blank("title", self.title.as_deref(), MAX_TITLE_LEN);
        errors.optional_text("description", self.description.as_deref(), MAX_DESCRIPTION_LEN);
        errors.optional_text("location", self.location.as_deref(), MAX_LOCATION_LEN);
        errors.non_blank("event_type", self.event_type.as_deref(), 50);
        errors.time_order("end_datetime", self.start_datetime, self.end_datetime);
        errors.non_negative("budget_allocated", self.budget_allocated);
        errors.non_negative("budget_spent", self.budget_spent);
        if let Some(max) = self.max_attendees {
            errors.range("max_attendees", max.into(), 1, 100_000);
        }
        errors.finish()
    }
}

/// Query string for GET /api/events
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilter {
    pub status: Option<EventStatus>,
    pub committee_id: Option<Uuid>,
    /// Only events that have not ended yet
    #[serde(default)]
    pub upcoming: bool,
}
