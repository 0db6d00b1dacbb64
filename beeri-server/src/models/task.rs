//! Task payloads

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{Validate, ValidationErrors};
use beeri_core::FieldRule;

const MAX_TITLE_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 5000;

/// Maximum ids per bulk request
pub const MAX_BULK_IDS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Blocked,
    Done,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Blocked => "blocked",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }

    /// Statuses that never count as overdue
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// POST /api/tasks
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub owner_name: Option<String>,
    pub owner_phone: Option<String>,
    pub event_id: Option<Uuid>,
    pub committee_id: Option<Uuid>,
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
}

impl Validate for CreateTask {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("title", &self.title, MAX_TITLE_LEN);
        errors.optional_text("description", self.description.as_deref(), MAX_DESCRIPTION_LEN);
        errors.optional_text("owner_name", self.owner_name.as_deref(), 100);
        validate_phone(&mut errors, "owner_phone", self.owner_phone.as_deref());
        if self.tag_ids.len() > 50 {
            errors.push("tag_ids", FieldRule::OutOfRange { min: 0, max: 50 });
        }
        errors.finish()
    }
}

/// PUT /api/tasks/{id}
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    pub owner_name: Option<String>,
    pub owner_phone: Option<String>,
    pub event_id: Option<Uuid>,
    pub committee_id: Option<Uuid>,
}

impl Validate for UpdateTask {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.non_blank("title", self.title.as_deref(), MAX_TITLE_LEN);
        errors.optional_text("description", self.description.as_deref(), MAX_DESCRIPTION_LEN);
        errors.optional_text("owner_name", self.owner_name.as_deref(), 100);
        validate_phone(&mut errors, "owner_phone", self.owner_phone.as_deref());
        errors.finish()
    }
}

/// PATCH /api/tasks/{id}/status
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeTaskStatus {
    pub status: TaskStatus,
}

impl Validate for ChangeTaskStatus {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

/// PUT /api/tasks/{id}/tags
#[derive(Debug, Clone, Deserialize)]
pub struct SetTaskTags {
    pub tag_ids: Vec<Uuid>,
}

impl Validate for SetTaskTags {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.tag_ids.len() > 50 {
            errors.push("tag_ids", FieldRule::OutOfRange { min: 0, max: 50 });
        }
        errors.finish()
    }
}

/// Query string for GET /api/tasks
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub event_id: Option<Uuid>,
    pub tag_id: Option<Uuid>,
    #[serde(default)]
    pub overdue: bool,
}

/// POST /api/<resource>/bulk-delete
#[derive(Debug, Clone, Deserialize)]
pub struct BulkDelete {
    pub ids: Vec<Uuid>,
}

impl Validate for BulkDelete {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.ids.is_empty() {
            errors.push("ids", FieldRule::Required);
        } else if self.ids.len() > MAX_BULK_IDS {
            errors.push(
                "ids",
                FieldRule::OutOfRange {
                    min: 1,
                    max: MAX_BULK_IDS as i64,
                },
            );
        }
        errors.finish()
    }
}

/// Israeli phone numbers: digits with optional +, spaces and dashes.
pub(crate) fn validate_phone(errors: &mut ValidationErrors, field: &'static str, value: Option<&str>) {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return;
    };
    let digits = raw.chars().filter(char::is_ascii_digit).count();
    let allowed = raw
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
    if !allowed || !(9..=15).contains(&digits) {
        errors.push(field, FieldRule::InvalidFormat);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_defaults() {
        let task: CreateTask = serde_json::from_value(json!({"title": "להזמין בלונים"})).unwrap();
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, TaskPriority::Normal);
        assert!(task.tag_ids.is_empty());
        assert!(task.validate().is_ok());
    }

    #[test]
    fn phone_validation() {
        let mut errors = ValidationErrors::new();
        validate_phone(&mut errors, "owner_phone", Some("050-1234567"));
        validate_phone(&mut errors, "owner_phone", Some("+972 50 123 4567"));
        validate_phone(&mut errors, "owner_phone", Some(""));
        assert!(errors.is_empty());

        validate_phone(&mut errors, "owner_phone", Some("call me"));
        validate_phone(&mut errors, "owner_phone", Some("123"));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn bulk_delete_bounds() {
        assert!(BulkDelete { ids: vec![] }.validate().is_err());
        assert!(BulkDelete { ids: vec![Uuid::new_v4()] }.validate().is_ok());
        let many = (0..=MAX_BULK_IDS).map(|_| Uuid::new_v4()).collect();
        assert!(BulkDelete { ids: many }.validate().is_err());
    }

    #[test]
    fn closed_statuses() {
        assert!(TaskStatus::Done.is_closed());
        assert!(TaskStatus::Cancelled.is_closed());
        assert!(!TaskStatus::Blocked.is_closed());
    }
}
