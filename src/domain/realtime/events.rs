//! Realtime events emitted when a mutation commits.
//!
//! Each variant is a plain data record built once, fully populated, and
//! read-only afterwards:
//!
//! - `FieldEvent`, `RecordEvent`, `ViewEvent` carry a post-mutation
//!   snapshot and the ordered ops of the transaction.
//! - `RecordCreatedEvent`, `RecordUpdatedEvent` carry the submission context
//!   of the realtime-sync pipeline instead of ops.
//!
//! Names are checked against the variant's legal subset at construction.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::domain::foundation::{DomainError, ErrorCode, FieldId, RecordId, TableId, ViewId};

use super::action::TableActionKey;
use super::event_name::{validate_event_name, EventName, EventVariant};

/// Post-mutation state of an entity. Opaque to this layer.
pub type Snapshot = JsonValue;

/// One atomic operation within a mutation.
///
/// Serialized as `{ "name": ..., ...params }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpContext {
    name: String,
    #[serde(flatten)]
    params: Map<String, JsonValue>,
}

impl OpContext {
    /// Creates an op with the given name and parameters.
    ///
    /// A `name` entry inside `params` is dropped; the explicit name wins.
    pub fn new(name: impl Into<String>, mut params: Map<String, JsonValue>) -> Self {
        params.remove("name");
        Self {
            name: name.into(),
            params,
        }
    }

    /// Creates an op with no parameters.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, Map::new())
    }

    /// Adds a parameter. Only usable before the op is attached to an event.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        let key = key.into();
        if key != "name" {
            self.params.insert(key, value.into());
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &Map<String, JsonValue> {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&JsonValue> {
        self.params.get(key)
    }
}

/// Submission context handed over by the realtime-sync pipeline.
///
/// Kept as the exact JSON object received so it round-trips losslessly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmitContext(Map<String, JsonValue>);

impl SubmitContext {
    pub fn new(fields: Map<String, JsonValue>) -> Self {
        Self(fields)
    }

    /// Wraps a JSON value that must be an object.
    ///
    /// # Errors
    ///
    /// `ValidationFailed` if the value is not a JSON object.
    pub fn from_value(value: JsonValue) -> Result<Self, DomainError> {
        match value {
            JsonValue::Object(map) => Ok(Self(map)),
            other => Err(DomainError::new(
                ErrorCode::ValidationFailed,
                format!("Submit context must be an object, got {}", json_kind(&other)),
            )),
        }
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, JsonValue> {
        &self.0
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FieldEvent
// ════════════════════════════════════════════════════════════════════════════

/// A field was created or updated.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEvent {
    event_name: EventName,
    table_id: TableId,
    field_id: FieldId,
    snapshot: Snapshot,
    ops: Vec<OpContext>,
}

impl FieldEvent {
    /// # Errors
    ///
    /// `IllegalEventName` unless `event_name` is `FieldCreated` or `FieldUpdated`.
    pub fn new(
        event_name: EventName,
        table_id: TableId,
        field_id: FieldId,
        snapshot: Snapshot,
        ops: Vec<OpContext>,
    ) -> Result<Self, DomainError> {
        validate_event_name(EventVariant::Field, event_name)?;
        Ok(Self {
            event_name,
            table_id,
            field_id,
            snapshot,
            ops,
        })
    }

    pub fn event_name(&self) -> EventName {
        self.event_name
    }

    pub fn table_id(&self) -> &TableId {
        &self.table_id
    }

    pub fn field_id(&self) -> &FieldId {
        &self.field_id
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn ops(&self) -> &[OpContext] {
        &self.ops
    }
}

// ════════════════════════════════════════════════════════════════════════════
// RecordEvent
// ════════════════════════════════════════════════════════════════════════════

/// A record was created or updated.
///
/// Bulk creation may carry the created snapshot with an empty op list.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordEvent {
    event_name: EventName,
    table_id: TableId,
    record_id: RecordId,
    snapshot: Snapshot,
    ops: Vec<OpContext>,
}

impl RecordEvent {
    /// # Errors
    ///
    /// `IllegalEventName` unless `event_name` is `RecordCreated` or `RecordUpdated`.
    pub fn new(
        event_name: EventName,
        table_id: TableId,
        record_id: RecordId,
        snapshot: Snapshot,
        ops: Vec<OpContext>,
    ) -> Result<Self, DomainError> {
        validate_event_name(EventVariant::Record, event_name)?;
        Ok(Self {
            event_name,
            table_id,
            record_id,
            snapshot,
            ops,
        })
    }

    pub fn event_name(&self) -> EventName {
        self.event_name
    }

    pub fn table_id(&self) -> &TableId {
        &self.table_id
    }

    pub fn record_id(&self) -> &RecordId {
        &self.record_id
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn ops(&self) -> &[OpContext] {
        &self.ops
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ViewEvent
// ════════════════════════════════════════════════════════════════════════════

/// A view was created or updated.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewEvent {
    event_name: EventName,
    table_id: TableId,
    view_id: ViewId,
    snapshot: Snapshot,
    ops: Vec<OpContext>,
}

impl ViewEvent {
    /// # Errors
    ///
    /// `IllegalEventName` unless `event_name` is `ViewCreated` or `ViewUpdated`.
    pub fn new(
        event_name: EventName,
        table_id: TableId,
        view_id: ViewId,
        snapshot: Snapshot,
        ops: Vec<OpContext>,
    ) -> Result<Self, DomainError> {
        validate_event_name(EventVariant::View, event_name)?;
        Ok(Self {
            event_name,
            table_id,
            view_id,
            snapshot,
            ops,
        })
    }

    pub fn event_name(&self) -> EventName {
        self.event_name
    }

    pub fn table_id(&self) -> &TableId {
        &self.table_id
    }

    pub fn view_id(&self) -> &ViewId {
        &self.view_id
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn ops(&self) -> &[OpContext] {
        &self.ops
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Submission-context envelopes
// ════════════════════════════════════════════════════════════════════════════

/// Record creation as seen by the realtime-sync submission pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordCreatedEvent {
    table_id: TableId,
    record_id: RecordId,
    context: SubmitContext,
}

impl RecordCreatedEvent {
    pub fn new(table_id: TableId, record_id: RecordId, context: SubmitContext) -> Self {
        Self {
            table_id,
            record_id,
            context,
        }
    }

    pub fn event_name(&self) -> EventName {
        EventName::RecordCreated
    }

    pub fn table_id(&self) -> &TableId {
        &self.table_id
    }

    pub fn record_id(&self) -> &RecordId {
        &self.record_id
    }

    pub fn context(&self) -> &SubmitContext {
        &self.context
    }
}

/// Record update as seen by the realtime-sync submission pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordUpdatedEvent {
    table_id: TableId,
    record_id: RecordId,
    context: SubmitContext,
}

impl RecordUpdatedEvent {
    pub fn new(table_id: TableId, record_id: RecordId, context: SubmitContext) -> Self {
        Self {
            table_id,
            record_id,
            context,
        }
    }

    pub fn event_name(&self) -> EventName {
        EventName::RecordUpdated
    }

    pub fn table_id(&self) -> &TableId {
        &self.table_id
    }

    pub fn record_id(&self) -> &RecordId {
        &self.record_id
    }

    pub fn context(&self) -> &SubmitContext {
        &self.context
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Event
// ════════════════════════════════════════════════════════════════════════════

/// Any realtime event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Field(FieldEvent),
    Record(RecordEvent),
    View(ViewEvent),
    RecordCreated(RecordCreatedEvent),
    RecordUpdated(RecordUpdatedEvent),
}

impl Event {
    pub fn variant(&self) -> EventVariant {
        match self {
            Event::Field(_) => EventVariant::Field,
            Event::Record(_) => EventVariant::Record,
            Event::View(_) => EventVariant::View,
            Event::RecordCreated(_) => EventVariant::RecordCreated,
            Event::RecordUpdated(_) => EventVariant::RecordUpdated,
        }
    }

    pub fn event_name(&self) -> EventName {
        match self {
            Event::Field(e) => e.event_name(),
            Event::Record(e) => e.event_name(),
            Event::View(e) => e.event_name(),
            Event::RecordCreated(e) => e.event_name(),
            Event::RecordUpdated(e) => e.event_name(),
        }
    }

    pub fn table_id(&self) -> &TableId {
        match self {
            Event::Field(e) => e.table_id(),
            Event::Record(e) => e.table_id(),
            Event::View(e) => e.table_id(),
            Event::RecordCreated(e) => e.table_id(),
            Event::RecordUpdated(e) => e.table_id(),
        }
    }

    /// Table-scope refresh key this event should coalesce into, if any.
    ///
    /// View events have no table-scope key.
    pub fn action_key(&self) -> Option<TableActionKey> {
        match self.event_name() {
            EventName::RecordCreated => Some(TableActionKey::AddRecord),
            EventName::RecordUpdated => Some(TableActionKey::SetRecord),
            EventName::FieldCreated => Some(TableActionKey::AddField),
            EventName::FieldUpdated => Some(TableActionKey::SetField),
            _ => None,
        }
    }
}

impl From<FieldEvent> for Event {
    fn from(e: FieldEvent) -> Self {
        Event::Field(e)
    }
}

impl From<RecordEvent> for Event {
    fn from(e: RecordEvent) -> Self {
        Event::Record(e)
    }
}

impl From<ViewEvent> for Event {
    fn from(e: ViewEvent) -> Self {
        Event::View(e)
    }
}

impl From<RecordCreatedEvent> for Event {
    fn from(e: RecordCreatedEvent) -> Self {
        Event::RecordCreated(e)
    }
}

impl From<RecordUpdatedEvent> for Event {
    fn from(e: RecordUpdatedEvent) -> Self {
        Event::RecordUpdated(e)
    }
}
