//! Parent-submitted content: anonymous feedback, ideas, skill survey

use serde::{Deserialize, Serialize};

use super::task::validate_phone;
use super::validation::{Validate, ValidationErrors};
use beeri_core::FieldRule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatus {
    #[default]
    New,
    Reviewed,
    Archived,
}

impl FeedbackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Reviewed => "reviewed",
            Self::Archived => "archived",
        }
    }
}

/// POST /api/feedback (no auth, nothing identifying stored)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubmitFeedback {
    pub message: String,
    #[serde(default = "default_feedback_category")]
    pub category: String,
    pub rating: Option<i16>,
}

fn default_feedback_category() -> String {
    "general".to_string()
}

impl Validate for SubmitFeedback {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("message", &self.message, 5000);
        errors.require_text("category", &self.category, 50);
        if let Some(rating) = self.rating {
            errors.range("rating", rating.into(), 1, 5);
        }
        errors.finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeFeedbackStatus {
    pub status: FeedbackStatus,
}

impl Validate for ChangeFeedbackStatus {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdeaStatus {
    #[default]
    New,
    UnderReview,
    Approved,
    Rejected,
    Implemented,
}

impl IdeaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Implemented => "implemented",
        }
    }
}

/// POST /api/ideas
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubmitIdea {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub submitter_name: Option<String>,
}

impl Validate for SubmitIdea {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("title", &self.title, 200);
        errors.optional_text("description", self.description.as_deref(), 5000);
        errors.optional_text("category", self.category.as_deref(), 50);
        errors.optional_text("submitter_name", self.submitter_name.as_deref(), 100);
        errors.finish()
    }
}

/// PATCH /api/ideas/{id}
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewIdea {
    pub status: IdeaStatus,
    pub admin_notes: Option<String>,
}

impl Validate for ReviewIdea {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.optional_text("admin_notes", self.admin_notes.as_deref(), 2000);
        errors.finish()
    }
}

/// Known skills offered in the parent survey; free text goes to `other_skill`.
pub const KNOWN_SKILLS: &[&str] = &[
    "photography",
    "video_editing",
    "graphic_design",
    "cooking",
    "baking",
    "music",
    "dj",
    "decoration",
    "carpentry",
    "electrical",
    "event_planning",
    "fundraising",
    "translation",
    "it_support",
    "first_aid",
    "transportation",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactPreference {
    #[default]
    Whatsapp,
    Phone,
    Email,
}

impl ContactPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Whatsapp => "whatsapp",
            Self::Phone => "phone",
            Self::Email => "email",
        }
    }
}

/// POST /api/skills
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubmitSkills {
    pub parent_name: Option<String>,
    pub child_name: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub other_skill: Option<String>,
    #[serde(default)]
    pub preferred_contact: ContactPreference,
}

impl Validate for SubmitSkills {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.optional_text("parent_name", self.parent_name.as_deref(), 100);
        errors.optional_text("child_name", self.child_name.as_deref(), 100);
        validate_phone(&mut errors, "phone", self.phone.as_deref());
        errors.optional_text("other_skill", self.other_skill.as_deref(), 300);

        let has_other = self
            .other_skill
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty());
        if self.skills.is_empty() && !has_other {
            errors.push("skills", FieldRule::Required);
        }
        for skill in &self.skills {
            if !KNOWN_SKILLS.contains(&skill.as_str()) {
                errors.push("skills", FieldRule::NotAllowed { value: skill.clone() });
            }
        }
        errors.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn feedback_defaults() {
        let fb: SubmitFeedback = serde_json::from_value(json!({"message": "תודה רבה!"})).unwrap();
        assert_eq!(fb.category, "general");
        assert!(fb.validate().is_ok());
    }

    #[test]
    fn feedback_rating_range() {
        let fb = SubmitFeedback {
            message: "x".into(),
            category: "general".into(),
            rating: Some(0),
        };
        assert!(fb.validate().is_err());
    }

    #[test]
    fn skills_require_something() {
        let empty: SubmitSkills = serde_json::from_value(json!({})).unwrap();
        assert!(empty.validate().is_err());

        let other_only: SubmitSkills =
            serde_json::from_value(json!({"other_skill": "ריקוד"})).unwrap();
        assert!(other_only.validate().is_ok());
    }

    #[test]
    fn unknown_skill_named_in_error() {
        let s: SubmitSkills =
            serde_json::from_value(json!({"skills": ["cooking", "juggling"]})).unwrap();
        let errors = s.validate().unwrap_err();
        assert_eq!(
            errors.errors()[0].rule,
            FieldRule::NotAllowed { value: "juggling".into() }
        );
    }
}
