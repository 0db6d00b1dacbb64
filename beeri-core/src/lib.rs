//! beeri-core: configuration, errors and i18n shared by the BeeriManager
//! server and CLI.

pub mod clock;
pub mod config;
pub mod error;
pub mod i18n;
pub mod token;

pub use config::BeeriConfig;
pub use error::{CoreError, Result};
pub use i18n::{FieldRule, Locale, Message, Resource};
