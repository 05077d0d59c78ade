//! Payloads carried on a channel.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::DomainError;

use super::action::ActionTrigger;
use super::envelope::EventEnvelope;
use super::notification::UserNotification;

/// Everything the dispatch boundary may publish.
///
/// Untagged on the wire, so an event keeps exactly its envelope shape.
/// Consumers tell the kinds apart by their keys (`actions` for a trigger,
/// `notifyType` for a notification, `eventName` for an event). Variant
/// order matters for decoding: the envelope accepts any object and must
/// be tried last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelMessage {
    ActionTrigger(ActionTrigger),
    Notification(UserNotification),
    Event(EventEnvelope),
}

impl ChannelMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ChannelMessage::ActionTrigger(_) => "action_trigger",
            ChannelMessage::Notification(_) => "notification",
            ChannelMessage::Event(_) => "event",
        }
    }

    /// Encodes the message as JSON text.
    pub fn to_json(&self) -> Result<String, DomainError> {
        serde_json::to_string(self).map_err(DomainError::serialization)
    }

    /// Decodes JSON text received from the transport.
    pub fn from_json(text: &str) -> Result<Self, DomainError> {
        serde_json::from_str(text).map_err(DomainError::serialization)
    }
}

impl From<EventEnvelope> for ChannelMessage {
    fn from(envelope: EventEnvelope) -> Self {
        ChannelMessage::Event(envelope)
    }
}

impl From<ActionTrigger> for ChannelMessage {
    fn from(trigger: ActionTrigger) -> Self {
        ChannelMessage::ActionTrigger(trigger)
    }
}

impl From<UserNotification> for ChannelMessage {
    fn from(notification: UserNotification) -> Self {
        ChannelMessage::Notification(notification)
    }
}
