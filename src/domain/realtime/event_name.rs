//! Event names and the per-variant subsets they are legal in.
//!
//! A single flat enumeration covers every mutation the realtime layer can
//! name. Each event variant accepts only a fixed subset, looked up in a
//! static table and checked when the event is constructed.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Every event name known to the realtime layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventName {
    TableCreated,
    TableUpdated,
    TableDeleted,
    FieldCreated,
    FieldUpdated,
    FieldDeleted,
    RecordCreated,
    RecordUpdated,
    RecordDeleted,
    ViewCreated,
    ViewUpdated,
    ViewDeleted,
}

impl EventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::TableCreated => "TableCreated",
            EventName::TableUpdated => "TableUpdated",
            EventName::TableDeleted => "TableDeleted",
            EventName::FieldCreated => "FieldCreated",
            EventName::FieldUpdated => "FieldUpdated",
            EventName::FieldDeleted => "FieldDeleted",
            EventName::RecordCreated => "RecordCreated",
            EventName::RecordUpdated => "RecordUpdated",
            EventName::RecordDeleted => "RecordDeleted",
            EventName::ViewCreated => "ViewCreated",
            EventName::ViewUpdated => "ViewUpdated",
            EventName::ViewDeleted => "ViewDeleted",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The shape of an event, independent of its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventVariant {
    Field,
    Record,
    View,
    /// Submission-context envelope for a created record.
    RecordCreated,
    /// Submission-context envelope for an updated record.
    RecordUpdated,
}

const FIELD_NAMES: &[EventName] = &[EventName::FieldCreated, EventName::FieldUpdated];
const RECORD_NAMES: &[EventName] = &[EventName::RecordCreated, EventName::RecordUpdated];
const VIEW_NAMES: &[EventName] = &[EventName::ViewCreated, EventName::ViewUpdated];
const RECORD_CREATED_NAMES: &[EventName] = &[EventName::RecordCreated];
const RECORD_UPDATED_NAMES: &[EventName] = &[EventName::RecordUpdated];

impl EventVariant {
    /// Names this variant may carry.
    pub fn legal_names(&self) -> &'static [EventName] {
        match self {
            EventVariant::Field => FIELD_NAMES,
            EventVariant::Record => RECORD_NAMES,
            EventVariant::View => VIEW_NAMES,
            EventVariant::RecordCreated => RECORD_CREATED_NAMES,
            EventVariant::RecordUpdated => RECORD_UPDATED_NAMES,
        }
    }

    pub fn allows(&self, name: EventName) -> bool {
        self.legal_names().contains(&name)
    }
}

impl fmt::Display for EventVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventVariant::Field => "FieldEvent",
            EventVariant::Record => "RecordEvent",
            EventVariant::View => "ViewEvent",
            EventVariant::RecordCreated => "RecordCreatedEvent",
            EventVariant::RecordUpdated => "RecordUpdatedEvent",
        };
        f.write_str(s)
    }
}

/// Checks that `name` is legal for `variant`.
///
/// # Errors
///
/// `IllegalEventName` when the name is outside the variant's subset.
pub fn validate_event_name(variant: EventVariant, name: EventName) -> Result<(), DomainError> {
    if variant.allows(name) {
        return Ok(());
    }
    Err(DomainError::new(
        ErrorCode::IllegalEventName,
        format!("{} cannot carry event name {}", variant, name),
    )
    .with_detail("variant", variant.to_string())
    .with_detail("event_name", name.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_variant_accepts_field_updated() {
        assert!(validate_event_name(EventVariant::Field, EventName::FieldUpdated).is_ok());
        assert!(validate_event_name(EventVariant::Field, EventName::FieldCreated).is_ok());
    }

    #[test]
    fn field_variant_rejects_view_created() {
        let err = validate_event_name(EventVariant::Field, EventName::ViewCreated).unwrap_err();
        assert_eq!(err.code, ErrorCode::IllegalEventName);
        assert_eq!(err.details.get("event_name"), Some(&"ViewCreated".to_string()));
    }

    #[test]
    fn deleted_names_are_not_legal_for_any_variant() {
        let variants = [
            EventVariant::Field,
            EventVariant::Record,
            EventVariant::View,
            EventVariant::RecordCreated,
            EventVariant::RecordUpdated,
        ];
        for variant in variants {
            for name in [EventName::FieldDeleted, EventName::RecordDeleted, EventName::ViewDeleted] {
                assert!(!variant.allows(name), "{} allowed {}", variant, name);
            }
        }
    }

    #[test]
    fn submission_variants_have_single_name() {
        assert_eq!(
            EventVariant::RecordCreated.legal_names(),
            &[EventName::RecordCreated]
        );
        assert_eq!(
            EventVariant::RecordUpdated.legal_names(),
            &[EventName::RecordUpdated]
        );
    }

    #[test]
    fn event_name_serializes_as_pascal_case() {
        let json = serde_json::to_string(&EventName::RecordUpdated).unwrap();
        assert_eq!(json, r#""RecordUpdated""#);

        let name: EventName = serde_json::from_str(r#""ViewCreated""#).unwrap();
        assert_eq!(name, EventName::ViewCreated);
    }

    #[test]
    fn display_matches_serialized_form() {
        assert_eq!(EventName::FieldCreated.to_string(), "FieldCreated");
        assert_eq!(EventVariant::View.to_string(), "ViewEvent");
    }
}
