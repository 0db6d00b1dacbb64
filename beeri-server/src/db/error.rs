//! Database error type
//!
//! Constraint violations are classified so the HTTP layer can answer 400
//! instead of 500 when the database rejects user input.

use beeri_core::Resource;
use sqlx::error::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),

    #[error("not found: {} '{id}'", .resource.as_str())]
    NotFound { resource: Resource, id: String },

    #[error("duplicate {}", .resource.as_str())]
    Duplicate { resource: Resource },

    #[error("unique constraint violated: {constraint:?}")]
    Unique { constraint: Option<String> },

    #[error("reference constraint violated: {constraint:?}")]
    InvalidReference { constraint: Option<String> },

    #[error("check constraint violated: {constraint:?}")]
    Constraint { constraint: Option<String> },
}

impl DbError {
    pub fn not_found(resource: Resource, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Name the resource behind a unique violation.
    pub fn duplicate_of(self, resource: Resource) -> Self {
        match self {
            Self::Unique { .. } => Self::Duplicate { resource },
            other => other,
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db) = e.as_database_error() {
            let constraint = db.constraint().map(str::to_owned);
            match db.kind() {
                ErrorKind::UniqueViolation => return Self::Unique { constraint },
                ErrorKind::ForeignKeyViolation => return Self::InvalidReference { constraint },
                ErrorKind::CheckViolation | ErrorKind::NotNullViolation => {
                    return Self::Constraint { constraint }
                }
                _ => {}
            }
        }
        Self::Sqlx(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_of_only_rewrites_unique() {
        let e = DbError::Unique { constraint: Some("tags_name_key".into()) }.duplicate_of(Resource::Tag);
        assert!(matches!(e, DbError::Duplicate { resource: Resource::Tag }));

        let e = DbError::not_found(Resource::Tag, "x").duplicate_of(Resource::Tag);
        assert!(matches!(e, DbError::NotFound { .. }));
    }

    #[test]
    fn row_not_found_stays_sqlx() {
        let e = DbError::from(sqlx::Error::RowNotFound);
        assert!(matches!(e, DbError::Sqlx(_)));
    }

    #[test]
    fn display_names_resource() {
        let e = DbError::not_found(Resource::GroceryItem, "42");
        assert_eq!(e.to_string(), "not found: grocery_item '42'");
    }
}
