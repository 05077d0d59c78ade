//! Error types for the domain layer.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Errors that occur while validating wire-level inputs.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("'{value}' is not a member of {set}")]
    NotInSet { set: &'static str, value: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates a set-membership validation error.
    pub fn not_in_set(set: &'static str, value: impl Into<String>) -> Self {
        ValidationError::NotInSet {
            set,
            value: value.into(),
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    InvalidChannel,
    InvalidActionKey,

    // Construction errors
    IllegalEventName,

    // Serialization errors
    SerializationFailed,

    // Transport errors
    PublishFailed,

    // Infrastructure errors
    CacheError,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::InvalidChannel => "INVALID_CHANNEL",
            ErrorCode::InvalidActionKey => "INVALID_ACTION_KEY",
            ErrorCode::IllegalEventName => "ILLEGAL_EVENT_NAME",
            ErrorCode::SerializationFailed => "SERIALIZATION_FAILED",
            ErrorCode::PublishFailed => "PUBLISH_FAILED",
            ErrorCode::CacheError => "CACHE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Standard domain error with code, message, and optional details.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Wraps a [`ValidationError`] under the given code.
    pub fn from_validation(code: ErrorCode, err: ValidationError) -> Self {
        Self::new(code, err.to_string())
    }

    /// Wraps a serde_json failure as a serialization error.
    pub fn serialization(err: serde_json::Error) -> Self {
        Self::new(ErrorCode::SerializationFailed, err.to_string())
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_empty_field_displays_correctly() {
        let err = ValidationError::empty_field("tableId");
        assert_eq!(format!("{}", err), "Field 'tableId' cannot be empty");
    }

    #[test]
    fn validation_error_not_in_set_displays_correctly() {
        let err = ValidationError::not_in_set("TableActionKey", "applyViewFilter");
        assert_eq!(
            format!("{}", err),
            "'applyViewFilter' is not a member of TableActionKey"
        );
    }

    #[test]
    fn domain_error_displays_code_and_message() {
        let err = DomainError::new(ErrorCode::IllegalEventName, "ViewCreated is not a field event");
        assert_eq!(
            format!("{}", err),
            "[ILLEGAL_EVENT_NAME] ViewCreated is not a field event"
        );
    }

    #[test]
    fn domain_error_from_validation_keeps_message() {
        let err = DomainError::from_validation(
            ErrorCode::InvalidActionKey,
            ValidationError::not_in_set("TableActionKey", "bogus"),
        );
        assert_eq!(err.code, ErrorCode::InvalidActionKey);
        assert!(err.message.contains("bogus"));
    }

    #[test]
    fn domain_error_with_detail_adds_detail() {
        let err = DomainError::new(ErrorCode::PublishFailed, "Publish failed")
            .with_detail("channel", "__action_trigger_tblA");

        assert_eq!(
            err.details.get("channel"),
            Some(&"__action_trigger_tblA".to_string())
        );
    }

    #[test]
    fn error_code_display_formats_correctly() {
        assert_eq!(format!("{}", ErrorCode::InvalidChannel), "INVALID_CHANNEL");
        assert_eq!(format!("{}", ErrorCode::InternalError), "INTERNAL_ERROR");
    }
}
