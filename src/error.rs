//! Error types for the app spec codec.
//!
//! This module provides the error hierarchy for every stage of a conversion:
//! loading configuration trees, validating them, and encoding them into a
//! typed application specification. Decoding is total and never fails.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the app spec codec.
#[derive(Debug, Error)]
pub enum AppSpecError {
    /// Configuration loading or validation errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Errors raised while encoding a configuration tree.
    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Errors raised while (de)serializing a specification document.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization error.
        message: String,
    },

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },
}

/// Path-qualified errors produced while encoding a configuration tree.
///
/// Every variant names the offending field using dotted notation, for
/// example `spec.service[0].termination.grace_period_seconds`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// A field holds a value of the wrong shape.
    #[error("{path}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Field path.
        path: String,
        /// Expected shape.
        expected: &'static str,
        /// Shape actually found.
        found: &'static str,
    },

    /// A numeric field lies outside its declared bounds.
    #[error("{path}: value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Field path.
        path: String,
        /// Offending value.
        value: i64,
        /// Inclusive lower bound.
        min: i64,
        /// Inclusive upper bound.
        max: i64,
    },

    /// A floating point field is negative or not a finite number.
    #[error("{path}: value {value} must be a finite number >= 0")]
    InvalidFloat {
        /// Field path.
        path: String,
        /// Offending value as written.
        value: String,
    },

    /// An enumerated field holds an unknown value.
    #[error("{path}: invalid value '{value}', expected one of: {allowed}")]
    InvalidEnum {
        /// Field path.
        path: String,
        /// Offending value.
        value: String,
        /// Comma separated list of accepted values.
        allowed: String,
    },

    /// A required field or nested block is missing.
    #[error("{path}: required field is missing")]
    MissingRequired {
        /// Field path.
        path: String,
    },

    /// A block declared to hold at most `max` items holds more.
    #[error("{path}: at most {max} item(s) allowed, found {found}")]
    TooManyItems {
        /// Field path.
        path: String,
        /// Maximum number of items.
        max: usize,
        /// Number of items found.
        found: usize,
    },

    /// More than one mutually exclusive alternative is set.
    #[error("{path}: only one of [{}] may be set", fields.join(", "))]
    ConflictingFields {
        /// Path of the enclosing block.
        path: String,
        /// The alternatives that were set.
        fields: Vec<String>,
    },

    /// Two components share a name.
    #[error("{path}: duplicate component name '{name}'")]
    DuplicateName {
        /// Field path of the second occurrence.
        path: String,
        /// The duplicated name.
        name: String,
    },

    /// A string field has an invalid length.
    #[error("{path}: length {length} is out of range [{min}, {max}]")]
    InvalidLength {
        /// Field path.
        path: String,
        /// Actual length in characters.
        length: usize,
        /// Inclusive minimum length.
        min: usize,
        /// Inclusive maximum length.
        max: usize,
    },
}

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, AppSpecError>;

/// Result type alias for encode operations.
pub type EncodeResult<T> = std::result::Result<T, EncodeError>;

impl AppSpecError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Creates a serialization error with the given message.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

impl EncodeError {
    /// Returns the field path the error refers to.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::TypeMismatch { path, .. }
            | Self::OutOfRange { path, .. }
            | Self::InvalidFloat { path, .. }
            | Self::InvalidEnum { path, .. }
            | Self::MissingRequired { path }
            | Self::TooManyItems { path, .. }
            | Self::ConflictingFields { path, .. }
            | Self::DuplicateName { path, .. }
            | Self::InvalidLength { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_error_display_includes_path() {
        let err = EncodeError::OutOfRange {
            path: String::from("spec.worker[0].termination.grace_period_seconds"),
            value: 601,
            min: 1,
            max: 600,
        };
        assert_eq!(
            err.to_string(),
            "spec.worker[0].termination.grace_period_seconds: value 601 is out of range [1, 600]"
        );
        assert_eq!(err.path(), "spec.worker[0].termination.grace_period_seconds");
    }

    #[test]
    fn test_invalid_float_display_keeps_value() {
        let err = EncodeError::InvalidFloat {
            path: String::from("spec.service[0].alert[0].value"),
            value: (-0.5f64).to_string(),
        };
        assert_eq!(
            err.to_string(),
            "spec.service[0].alert[0].value: value -0.5 must be a finite number >= 0"
        );
    }

    #[test]
    fn test_conflicting_fields_display() {
        let err = EncodeError::ConflictingFields {
            path: String::from("spec.service[0]"),
            fields: vec![String::from("git"), String::from("github")],
        };
        assert_eq!(err.to_string(), "spec.service[0]: only one of [git, github] may be set");
    }

    #[test]
    fn test_encode_error_converts_into_app_error() {
        let err: AppSpecError = EncodeError::MissingRequired {
            path: String::from("spec.name"),
        }
        .into();
        assert!(matches!(err, AppSpecError::Encode(_)));
    }
}
