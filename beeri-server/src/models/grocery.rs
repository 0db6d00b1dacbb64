//! Grocery list payloads and claim planning
//!
//! A grocery list is shared with parents through its share token. Each item
//! row is either open (`claimed_by` null) or claimed by one parent. Claiming
//! part of an open row splits it into an open remainder and a claimed row.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::validation::{Validate, ValidationErrors};
use beeri_core::FieldRule;

const MAX_ITEMS_PER_REQUEST: usize = 100;
const MAX_QUANTITY: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroceryStatus {
    #[default]
    Active,
    Completed,
    Cancelled,
}

impl GroceryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// POST /api/grocery
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateGroceryList {
    pub event_name: String,
    pub event_date: Option<NaiveDate>,
    pub event_time: Option<String>,
    pub event_address: Option<String>,
    pub class_name: Option<String>,
    pub creator_name: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<NewGroceryItem>,
}

impl Validate for CreateGroceryList {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("event_name", &self.event_name, 200);
        errors.optional_text("event_time", self.event_time.as_deref(), 20);
        errors.optional_text("event_address", self.event_address.as_deref(), 300);
        errors.optional_text("class_name", self.class_name.as_deref(), 50);
        errors.optional_text("creator_name", self.creator_name.as_deref(), 100);
        errors.optional_text("notes", self.notes.as_deref(), 2000);
        validate_items(&mut errors, &self.items, true);
        errors.finish()
    }
}

/// PATCH /api/grocery/{token}
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeGroceryStatus {
    pub status: GroceryStatus,
}

impl Validate for ChangeGroceryStatus {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewGroceryItem {
    pub item_name: String,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    pub notes: Option<String>,
}

fn default_quantity() -> i32 {
    1
}

/// POST /api/grocery/{token}/items
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AddGroceryItems {
    pub items: Vec<NewGroceryItem>,
}

impl Validate for AddGroceryItems {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_items(&mut errors, &self.items, false);
        errors.finish()
    }
}

fn validate_items(errors: &mut ValidationErrors, items: &[NewGroceryItem], allow_empty: bool) {
    if items.is_empty() && !allow_empty {
        errors.push("items", FieldRule::Required);
    }
    if items.len() > MAX_ITEMS_PER_REQUEST {
        errors.push(
            "items",
            FieldRule::OutOfRange {
                min: 1,
                max: MAX_ITEMS_PER_REQUEST as i64,
            },
        );
    }
    for item in items {
        errors.require_text("item_name", &item.item_name, 100);
        errors.range("quantity", item.quantity.into(), 1, MAX_QUANTITY);
        errors.optional_text("notes", item.notes.as_deref(), 500);
    }
}

/// PUT /api/grocery/{token}/items/{item_id}
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateGroceryItem {
    pub item_name: Option<String>,
    pub quantity: Option<i32>,
    pub notes: Option<String>,
    pub display_order: Option<i32>,
}

impl Validate for UpdateGroceryItem {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.non_blank("item_name", self.item_name.as_deref(), 100);
        if let Some(q) = self.quantity {
            errors.range("quantity", q.into(), 1, MAX_QUANTITY);
        }
        errors.optional_text("notes", self.notes.as_deref(), 500);
        errors.finish()
    }
}

/// POST /api/grocery/{token}/items/{item_id}/claim
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClaimItem {
    pub claimer_name: String,
    /// Omitted means "all of it"
    pub quantity: Option<i32>,
}

impl Validate for ClaimItem {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("claimer_name", &self.claimer_name, 100);
        if let Some(q) = self.quantity {
            errors.range("quantity", q.into(), 1, MAX_QUANTITY);
        }
        errors.finish()
    }
}

/// What a claim does to the item row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimPlan {
    /// The whole row becomes claimed
    Full,
    /// The row keeps `remaining` open units; a new row holds `claimed` units
    Split { remaining: i32, claimed: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimRejection {
    AlreadyClaimed,
    InvalidQuantity,
    ExceedsAvailable,
}

/// Decide how to satisfy a claim against an item row.
pub fn plan_claim(
    available: i32,
    already_claimed: bool,
    requested: Option<i32>,
) -> Result<ClaimPlan, ClaimRejection> {
    if already_claimed {
        return Err(ClaimRejection::AlreadyClaimed);
    }
    match requested {
        None => Ok(ClaimPlan::Full),
        Some(q) if q <= 0 => Err(ClaimRejection::InvalidQuantity),
        Some(q) if q > available => Err(ClaimRejection::ExceedsAvailable),
        Some(q) if q == available => Ok(ClaimPlan::Full),
        Some(q) => Ok(ClaimPlan::Split {
            remaining: available - q,
            claimed: q,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn full_claim_when_quantity_omitted_or_equal() {
        assert_eq!(plan_claim(3, false, None), Ok(ClaimPlan::Full));
        assert_eq!(plan_claim(3, false, Some(3)), Ok(ClaimPlan::Full));
    }

    #[test]
    fn partial_claim_splits() {
        assert_eq!(
            plan_claim(5, false, Some(2)),
            Ok(ClaimPlan::Split {
                remaining: 3,
                claimed: 2
            })
        );
    }

    #[test]
    fn rejections() {
        assert_eq!(plan_claim(2, true, None), Err(ClaimRejection::AlreadyClaimed));
        assert_eq!(plan_claim(2, false, Some(0)), Err(ClaimRejection::InvalidQuantity));
        assert_eq!(plan_claim(2, false, Some(3)), Err(ClaimRejection::ExceedsAvailable));
    }

    #[test]
    fn item_defaults_to_quantity_one() {
        let items: AddGroceryItems =
            serde_json::from_value(json!({"items": [{"item_name": "במבה"}]})).unwrap();
        assert_eq!(items.items[0].quantity, 1);
        assert!(items.validate().is_ok());
    }

    #[test]
    fn empty_add_rejected_but_empty_create_allowed() {
        assert!(AddGroceryItems { items: vec![] }.validate().is_err());
        let list: CreateGroceryList =
            serde_json::from_value(json!({"event_name": "פיקניק כיתתי"})).unwrap();
        assert!(list.validate().is_ok());
    }

    proptest! {
        #[test]
        fn split_conserves_quantity(available in 2i32..1000, take in 1i32..1000) {
            prop_assume!(take < available);
            match plan_claim(available, false, Some(take)) {
                Ok(ClaimPlan::Split { remaining, claimed }) => {
                    prop_assert_eq!(remaining + claimed, available);
                    prop_assert!(remaining > 0);
                    prop_assert_eq!(claimed, take);
                }
                other => prop_assert!(false, "unexpected plan {:?}", other),
            }
        }

        #[test]
        fn never_claims_more_than_available(available in 1i32..1000, take in 1i32..2000) {
            if let Ok(ClaimPlan::Split { claimed, .. }) = plan_claim(available, false, Some(take)) {
                prop_assert!(claimed < available);
            }
        }
    }
}
