//! Wire envelopes for realtime events.
//!
//! [`serialize_event`] flattens an event into a plain JSON mapping:
//!
//! ```text
//! { eventName, tableId, fieldId|recordId|viewId, snapshot, ops }   // Field/Record/View
//! { eventName, tableId, recordId, context }                         // submission variants
//! ```
//!
//! `snapshot`, `ops` and `context` stay nested exactly as the producer held
//! them. [`EventEnvelope::decode`] is the inverse for consumers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::domain::foundation::{DomainError, ErrorCode, FieldId, RecordId, TableId, ViewId};

use super::event_name::EventName;
use super::events::{
    Event, FieldEvent, OpContext, RecordCreatedEvent, RecordEvent, RecordUpdatedEvent, Snapshot,
    SubmitContext, ViewEvent,
};

/// Plain mapping of an event's attributes, ready for the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventEnvelope(Map<String, JsonValue>);

/// Serializes an event into its wire envelope.
///
/// Deterministic for a given event state.
///
/// # Errors
///
/// `SerializationFailed` when any part cannot be represented as JSON. No
/// partial envelope is returned.
pub fn serialize_event(event: &Event) -> Result<EventEnvelope, DomainError> {
    let mut map = Map::new();
    map.insert("eventName".into(), encode(&event.event_name())?);
    map.insert("tableId".into(), encode(event.table_id())?);

    match event {
        Event::Field(e) => {
            map.insert("fieldId".into(), encode(e.field_id())?);
            insert_body(&mut map, e.snapshot(), e.ops())?;
        }
        Event::Record(e) => {
            map.insert("recordId".into(), encode(e.record_id())?);
            insert_body(&mut map, e.snapshot(), e.ops())?;
        }
        Event::View(e) => {
            map.insert("viewId".into(), encode(e.view_id())?);
            insert_body(&mut map, e.snapshot(), e.ops())?;
        }
        Event::RecordCreated(e) => {
            map.insert("recordId".into(), encode(e.record_id())?);
            map.insert("context".into(), encode(e.context())?);
        }
        Event::RecordUpdated(e) => {
            map.insert("recordId".into(), encode(e.record_id())?);
            map.insert("context".into(), encode(e.context())?);
        }
    }

    Ok(EventEnvelope(map))
}

fn insert_body(
    map: &mut Map<String, JsonValue>,
    snapshot: &Snapshot,
    ops: &[OpContext],
) -> Result<(), DomainError> {
    map.insert("snapshot".into(), snapshot.clone());
    map.insert("ops".into(), encode(&ops)?);
    Ok(())
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<JsonValue, DomainError> {
    serde_json::to_value(value).map_err(DomainError::serialization)
}

/// Loose decoding target covering every envelope shape.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEvent {
    event_name: EventName,
    table_id: TableId,
    field_id: Option<FieldId>,
    record_id: Option<RecordId>,
    view_id: Option<ViewId>,
    #[serde(default)]
    snapshot: Snapshot,
    #[serde(default)]
    ops: Vec<OpContext>,
    context: Option<SubmitContext>,
}

impl EventEnvelope {
    pub fn as_map(&self) -> &Map<String, JsonValue> {
        &self.0
    }

    pub fn into_value(self) -> JsonValue {
        JsonValue::Object(self.0)
    }

    pub fn event_name(&self) -> Option<&str> {
        self.0.get("eventName").and_then(JsonValue::as_str)
    }

    pub fn table_id(&self) -> Option<&str> {
        self.0.get("tableId").and_then(JsonValue::as_str)
    }

    /// Encodes the envelope as JSON text.
    pub fn to_json(&self) -> Result<String, DomainError> {
        serde_json::to_string(&self.0).map_err(DomainError::serialization)
    }

    /// Parses JSON text received from the transport.
    pub fn from_json(text: &str) -> Result<Self, DomainError> {
        serde_json::from_str(text).map_err(DomainError::serialization)
    }

    /// Rebuilds the event this envelope describes.
    ///
    /// Event-name subsets are enforced exactly as on construction.
    ///
    /// # Errors
    ///
    /// `SerializationFailed` for a malformed envelope, `IllegalEventName`
    /// when the name does not fit the envelope's shape.
    pub fn decode(&self) -> Result<Event, DomainError> {
        let wire: WireEvent = serde_json::from_value(JsonValue::Object(self.0.clone()))
            .map_err(DomainError::serialization)?;

        if let Some(context) = wire.context {
            let record_id = wire.record_id.ok_or_else(|| malformed("recordId"))?;
            return match wire.event_name {
                EventName::RecordCreated => {
                    Ok(RecordCreatedEvent::new(wire.table_id, record_id, context).into())
                }
                EventName::RecordUpdated => {
                    Ok(RecordUpdatedEvent::new(wire.table_id, record_id, context).into())
                }
                other => Err(DomainError::new(
                    ErrorCode::IllegalEventName,
                    format!("Submission envelope cannot carry event name {}", other),
                )),
            };
        }

        let event = match (wire.field_id, wire.record_id, wire.view_id) {
            (Some(field_id), None, None) => FieldEvent::new(
                wire.event_name,
                wire.table_id,
                field_id,
                wire.snapshot,
                wire.ops,
            )?
            .into(),
            (None, Some(record_id), None) => RecordEvent::new(
                wire.event_name,
                wire.table_id,
                record_id,
                wire.snapshot,
                wire.ops,
            )?
            .into(),
            (None, None, Some(view_id)) => ViewEvent::new(
                wire.event_name,
                wire.table_id,
                view_id,
                wire.snapshot,
                wire.ops,
            )?
            .into(),
            _ => return Err(malformed("exactly one of fieldId, recordId, viewId")),
        };
        Ok(event)
    }
}

fn malformed(expected: &str) -> DomainError {
    DomainError::new(
        ErrorCode::SerializationFailed,
        format!("Malformed event envelope: expected {}", expected),
    )
}
