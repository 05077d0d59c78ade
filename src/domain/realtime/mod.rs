//! Realtime module - channel names, events, envelopes and action triggers.
//!
//! # Pieces
//!
//! - `channel` - Deterministic channel names for the four namespaces
//! - `event_name` - Flat event-name enumeration with per-variant subsets
//! - `events` - Field/Record/View events and submission-context envelopes
//! - `envelope` - `serialize_event` and the wire envelope
//! - `action` - Table-scope and view-scope action keys
//! - `trigger_buffer` - Per-table de-duplicating action-trigger buffer
//! - `notification` - Per-user notifications
//! - `message` - What a channel carries

mod action;
mod channel;
mod envelope;
mod event_name;
mod events;
mod message;
mod notification;
mod trigger_buffer;

pub use action::{ActionTrigger, TableActionKey, ViewActionKey};
pub use channel::{
    action_trigger_channel, cell_collaborator_channel, collaborator_channel,
    notification_channel, Channel, ChannelKey, ChannelNamespace,
};
pub use envelope::{serialize_event, EventEnvelope};
pub use event_name::{validate_event_name, EventName, EventVariant};
pub use events::{
    Event, FieldEvent, OpContext, RecordCreatedEvent, RecordEvent, RecordUpdatedEvent, Snapshot,
    SubmitContext, ViewEvent,
};
pub use message::ChannelMessage;
pub use notification::{NotificationType, UserNotification};
pub use trigger_buffer::ActionTriggerBuffer;
