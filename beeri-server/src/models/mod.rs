//! Domain models with validation
//!
//! Request bodies deserialize into these types and are checked with
//! [`Validate`] before any database call. Invalid input returns
//! `ValidationErrors`, not panic.

pub mod community;
pub mod directory;
pub mod event;
pub mod grocery;
pub mod notification;
pub mod pagination;
pub mod prom;
pub mod prom_stats;
pub mod protocol;
pub mod tag;
pub mod task;
pub mod validation;

pub use pagination::{Paginated, Pagination, PaginationParams};
pub use validation::{Validate, ValidationError, ValidationErrors};
