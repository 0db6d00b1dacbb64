/// Structured error types for beeri-core.
///
/// Binary crates (beeri-cli) wrap these with `anyhow`; the server maps them
/// onto its own error types.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for beeri-core operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// I/O operation failed
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Config file could not be parsed
    #[error("Invalid config file {path:?}: {reason}")]
    ConfigParse { path: PathBuf, reason: String },

    /// A config value is present but unusable
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// A required setting is missing
    #[error("Missing required setting {key}")]
    Missing { key: String },
}

/// Result type alias for beeri-core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    pub fn config_parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ConfigParse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_value(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn missing(key: impl Into<String>) -> Self {
        Self::Missing { key: key.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::missing("JWT_SECRET");
        assert_eq!(err.to_string(), "Missing required setting JWT_SECRET");

        let err = CoreError::invalid_value("BEERI_BIND", "nope", "not a socket address");
        assert!(err.to_string().contains("BEERI_BIND"));
        assert!(err.to_string().contains("not a socket address"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: CoreError = io_err.into();

        assert!(matches!(err, CoreError::Io { .. }));
    }
}
