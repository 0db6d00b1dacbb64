//! Push subscription and notification payloads

use serde::{Deserialize, Serialize};

use super::validation::{Validate, ValidationErrors};
use beeri_core::FieldRule;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// POST /api/notifications/subscribe - the browser's PushSubscription JSON
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Subscribe {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
    pub user_agent: Option<String>,
}

impl Validate for Subscribe {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("endpoint", &self.endpoint, 1000);
        if !self.endpoint.starts_with("https://") {
            errors.push("endpoint", FieldRule::InvalidFormat);
        }
        errors.require_text("keys.p256dh", &self.keys.p256dh, 200);
        errors.require_text("keys.auth", &self.keys.auth, 100);
        errors.optional_text("user_agent", self.user_agent.as_deref(), 500);
        errors.finish()
    }
}

/// POST /api/notifications/unsubscribe
#[derive(Debug, Clone, Deserialize)]
pub struct Unsubscribe {
    pub endpoint: String,
}

impl Validate for Unsubscribe {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("endpoint", &self.endpoint, 1000);
        errors.finish()
    }
}

/// POST /api/notifications/send
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SendNotification {
    pub title: String,
    pub body: String,
    pub url: Option<String>,
}

impl Validate for SendNotification {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("title", &self.title, 100);
        errors.require_text("body", &self.body, 500);
        errors.url("url", self.url.as_deref());
        errors.finish()
    }
}
