//! Committees, vendors, tickets and highlights
//!
//! Small reference tables with plain create/update payloads.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::tag::validate_color;
use super::task::validate_phone;
use super::validation::{Validate, ValidationErrors};
use beeri_core::FieldRule;

// ---------------------------------------------------------------------------
// Committees

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateCommittee {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub chair_name: Option<String>,
}

impl Validate for CreateCommittee {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("name", &self.name, 100);
        errors.optional_text("description", self.description.as_deref(), 2000);
        validate_color(&mut errors, self.color.as_deref());
        errors.optional_text("chair_name", self.chair_name.as_deref(), 100);
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateCommittee {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub chair_name: Option<String>,
}

impl Validate for UpdateCommittee {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.non_blank("name", self.name.as_deref(), 100);
        errors.optional_text("description", self.description.as_deref(), 2000);
        validate_color(&mut errors, self.color.as_deref());
        errors.optional_text("chair_name", self.chair_name.as_deref(), 100);
        errors.finish()
    }
}

// ---------------------------------------------------------------------------
// Vendors

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateVendor {
    pub name: String,
    pub category: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub notes: Option<String>,
    pub rating: Option<i16>,
}

impl Validate for CreateVendor {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("name", &self.name, 150);
        errors.optional_text("category", self.category.as_deref(), 50);
        errors.optional_text("contact_name", self.contact_name.as_deref(), 100);
        validate_phone(&mut errors, "phone", self.phone.as_deref());
        validate_email(&mut errors, self.email.as_deref());
        errors.url("website", self.website.as_deref());
        errors.optional_text("notes", self.notes.as_deref(), 5000);
        if let Some(rating) = self.rating {
            errors.range("rating", rating.into(), 1, 5);
        }
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateVendor {
    pub name: Option<String>,
    pub category: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub notes: Option<String>,
    pub rating: Option<i16>,
}

impl Validate for UpdateVendor {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.non_blank("name", self.name.as_deref(), 150);
        errors.optional_text("category", self.category.as_deref(), 50);
        errors.optional_text("contact_name", self.contact_name.as_deref(), 100);
        validate_phone(&mut errors, "phone", self.phone.as_deref());
        validate_email(&mut errors, self.email.as_deref());
        errors.url("website", self.website.as_deref());
        errors.optional_text("notes", self.notes.as_deref(), 5000);
        if let Some(rating) = self.rating {
            errors.range("rating", rating.into(), 1, 5);
        }
        errors.finish()
    }
}

fn validate_email(errors: &mut ValidationErrors, value: Option<&str>) {
    let Some(email) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return;
    };
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !email.contains(' ')
        }
        None => false,
    };
    if !valid || email.len() > 254 {
        errors.push("email", FieldRule::InvalidFormat);
    }
}

// ---------------------------------------------------------------------------
// Tickets

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Available,
    SoldOut,
    Archived,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::SoldOut => "sold_out",
            Self::Archived => "archived",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateTicket {
    pub title: String,
    pub description: Option<String>,
    pub event_date: Option<DateTime<Utc>>,
    pub venue: Option<String>,
    pub price: Option<f64>,
    pub quantity_available: Option<i32>,
    pub purchase_url: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub status: TicketStatus,
}

impl Validate for CreateTicket {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("title", &self.title, 200);
        errors.optional_text("description", self.description.as_deref(), 5000);
        errors.optional_text("venue", self.venue.as_deref(), 200);
        errors.non_negative("price", self.price);
        if let Some(q) = self.quantity_available {
            errors.range("quantity_available", q.into(), 0, 100_000);
        }
        errors.url("purchase_url", self.purchase_url.as_deref());
        errors.url("image_url", self.image_url.as_deref());
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateTicket {
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_date: Option<DateTime<Utc>>,
    pub venue: Option<String>,
    pub price: Option<f64>,
    pub quantity_available: Option<i32>,
    pub purchase_url: Option<String>,
    pub image_url: Option<String>,
    pub status: Option<TicketStatus>,
}

impl Validate for UpdateTicket {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.non_blank("title", self.title.as_deref(), 200);
        errors.optional_text("description", self.description.as_deref(), 5000);
        errors.optional_text("venue", self.venue.as_deref(), 200);
        errors.non_negative("price", self.price);
        if let Some(q) = self.quantity_available {
            errors.range("quantity_available", q.into(), 0, 100_000);
        }
        errors.url("purchase_url", self.purchase_url.as_deref());
        errors.url("image_url", self.image_url.as_deref());
        errors.finish()
    }
}

// ---------------------------------------------------------------------------
// Highlights

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateHighlight {
    pub title: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub category: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub cta_text: Option<String>,
    pub cta_link: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Validate for CreateHighlight {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("title", &self.title, 150);
        errors.optional_text("description", self.description.as_deref(), 2000);
        errors.optional_text("icon", self.icon.as_deref(), 16);
        errors.optional_text("category", self.category.as_deref(), 50);
        errors.optional_text("cta_text", self.cta_text.as_deref(), 50);
        errors.url("cta_link", self.cta_link.as_deref());
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateHighlight {
    pub title: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub category: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub cta_text: Option<String>,
    pub cta_link: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl Validate for UpdateHighlight {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.non_blank("title", self.title.as_deref(), 150);
        errors.optional_text("description", self.description.as_deref(), 2000);
        errors.optional_text("icon", self.icon.as_deref(), 16);
        errors.optional_text("category", self.category.as_deref(), 50);
        errors.optional_text("cta_text", self.cta_text.as_deref(), 50);
        errors.url("cta_link", self.cta_link.as_deref());
        errors.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_rating_bounds() {
        let vendor = CreateVendor {
            name: "הפקות שמח".into(),
            category: Some("dj".into()),
            contact_name: None,
            phone: Some("052-7654321".into()),
            email: Some("dj@example.co.il".into()),
            website: None,
            notes: None,
            rating: Some(6),
        };
        let errors = vendor.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.errors()[0].field, "rating");
    }

    #[test]
    fn email_shapes() {
        let mut errors = ValidationErrors::new();
        validate_email(&mut errors, Some("a@b.co"));
        validate_email(&mut errors, None);
        assert!(errors.is_empty());

        validate_email(&mut errors, Some("no-at-sign"));
        validate_email(&mut errors, Some("a@nodot"));
        validate_email(&mut errors, Some("@b.co"));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn ticket_negative_price_rejected() {
        let ticket = CreateTicket {
            title: "הצגה".into(),
            description: None,
            event_date: None,
            venue: None,
            price: Some(-5.0),
            quantity_available: None,
            purchase_url: None,
            image_url: None,
            status: TicketStatus::Available,
        };
        assert!(ticket.validate().is_err());
    }

    #[test]
    fn committee_color_checked() {
        let committee = CreateCommittee {
            name: "ועדת קישוט".into(),
            description: None,
            color: Some("blue".into()),
            chair_name: None,
        };
        assert!(committee.validate().is_err());
    }
}
