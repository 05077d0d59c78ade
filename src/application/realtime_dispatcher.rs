//! RealtimeDispatcher - The single producer of channel publishes.
//!
//! Mutation handlers hand finished events here. The dispatcher:
//! 1. Serializes the event into its wire envelope
//! 2. Publishes the envelope on the table's action-trigger channel
//! 3. Records the event's coarse action key for the next flush
//!
//! Serialization happens before anything is published, so a failed
//! envelope never reaches the transport and never dirties the buffer.
//!
//! Table and user ids must be non-empty here. An empty id still names a
//! channel, but no subscriber can parse that name to join it.

use std::sync::Arc;

use crate::config::RealtimeConfig;
use crate::domain::foundation::{DomainError, ErrorCode, TableId, UserId, ValidationError};
use crate::domain::realtime::{
    action_trigger_channel, notification_channel, serialize_event, ActionTriggerBuffer, Event,
    UserNotification,
};
use crate::ports::ChannelPublisher;

use super::{ActionTriggerFlusher, ActionTriggerFlusherConfig};

/// Builds a dispatcher and the flusher draining its buffer.
///
/// A mutation pipeline embedding this crate hands its events to the
/// dispatcher and spawns `flusher.run(shutdown)` next to it.
pub fn realtime_core(
    publisher: Arc<dyn ChannelPublisher>,
    config: &RealtimeConfig,
) -> (RealtimeDispatcher, ActionTriggerFlusher) {
    let buffer = Arc::new(ActionTriggerBuffer::new());
    let flusher = ActionTriggerFlusher::with_config(
        Arc::clone(&buffer),
        Arc::clone(&publisher),
        ActionTriggerFlusherConfig::default().with_window(config.coalesce_window()),
    );
    (RealtimeDispatcher::new(publisher, buffer), flusher)
}

/// Application service routing events, action keys and notifications.
pub struct RealtimeDispatcher {
    publisher: Arc<dyn ChannelPublisher>,
    buffer: Arc<ActionTriggerBuffer>,
}

impl RealtimeDispatcher {
    pub fn new(publisher: Arc<dyn ChannelPublisher>, buffer: Arc<ActionTriggerBuffer>) -> Self {
        Self { publisher, buffer }
    }

    /// Buffer shared with the flusher.
    pub fn buffer(&self) -> &Arc<ActionTriggerBuffer> {
        &self.buffer
    }

    /// Serializes and publishes an event, then buffers its action key.
    ///
    /// # Errors
    ///
    /// `ValidationFailed` for an empty table id or `SerializationFailed`,
    /// both raised before anything is published, otherwise the publisher's
    /// error. The action key is only buffered after a successful publish.
    pub async fn emit(&self, event: Event) -> Result<(), DomainError> {
        require_id("tableId", event.table_id().as_str())?;
        let envelope = serialize_event(&event)?;
        let channel = action_trigger_channel(event.table_id());

        self.publisher.publish(&channel, envelope.into()).await.map_err(|e| {
            tracing::warn!(
                channel = %channel,
                event_name = %event.event_name(),
                error = %e,
                "Failed to publish event"
            );
            e
        })?;

        tracing::debug!(
            channel = %channel,
            event_name = %event.event_name(),
            "Published event"
        );

        if let Some(key) = event.action_key() {
            self.buffer.push_key(event.table_id(), key).await;
        }
        Ok(())
    }

    /// Buffers a table-scope action key without publishing an event.
    ///
    /// # Errors
    ///
    /// `InvalidActionKey` when `key` is not a table-scope key,
    /// `ValidationFailed` for an empty table id.
    pub async fn trigger(&self, table_id: &TableId, key: &str) -> Result<(), DomainError> {
        require_id("tableId", table_id.as_str())?;
        self.buffer.push(table_id, key).await.map_err(|e| {
            tracing::debug!(table_id = %table_id, key, "Rejected action key");
            e
        })
    }

    /// Publishes a notification on the user's notification channel.
    pub async fn notify_user(
        &self,
        user_id: &UserId,
        notification: UserNotification,
    ) -> Result<(), DomainError> {
        require_id("userId", user_id.as_str())?;
        let channel = notification_channel(user_id);
        self.publisher.publish(&channel, notification.into()).await?;
        tracing::debug!(channel = %channel, "Published notification");
        Ok(())
    }
}

fn require_id(field: &str, id: &str) -> Result<(), DomainError> {
    if id.is_empty() {
        return Err(DomainError::from_validation(
            ErrorCode::ValidationFailed,
            ValidationError::empty_field(field),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::pubsub::InMemoryChannelBus;
    use crate::domain::foundation::{FieldId, RecordId, ViewId};
    use crate::domain::realtime::{
        ChannelMessage, EventName, FieldEvent, NotificationType, OpContext, RecordEvent,
        TableActionKey, ViewEvent,
    };
    use serde_json::json;

    fn setup() -> (Arc<InMemoryChannelBus>, RealtimeDispatcher) {
        let bus = Arc::new(InMemoryChannelBus::new());
        let dispatcher =
            RealtimeDispatcher::new(bus.clone(), Arc::new(ActionTriggerBuffer::new()));
        (bus, dispatcher)
    }

    fn record_created(table: &str) -> Event {
        RecordEvent::new(
            EventName::RecordCreated,
            TableId::new(table),
            RecordId::new("recY"),
            json!({"id": "recY"}),
            vec![OpContext::named("addRecord")],
        )
        .unwrap()
        .into()
    }

    #[tokio::test]
    async fn emit_publishes_envelope_on_action_trigger_channel() {
        let (bus, dispatcher) = setup();

        dispatcher.emit(record_created("tblA")).await.unwrap();

        let messages = bus.messages_on(&action_trigger_channel(&TableId::new("tblA")));
        assert_eq!(messages.len(), 1);
        match &messages[0] {
            ChannelMessage::Event(envelope) => {
                assert_eq!(envelope.event_name(), Some("RecordCreated"));
                assert_eq!(envelope.table_id(), Some("tblA"));
            }
            other => panic!("expected event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn emit_buffers_the_events_action_key() {
        let (_bus, dispatcher) = setup();
        let table = TableId::new("tblA");

        dispatcher.emit(record_created("tblA")).await.unwrap();
        let field: Event = FieldEvent::new(
            EventName::FieldUpdated,
            table.clone(),
            FieldId::new("fldX"),
            json!({}),
            vec![],
        )
        .unwrap()
        .into();
        dispatcher.emit(field).await.unwrap();

        assert_eq!(
            dispatcher.buffer().pending(&table).await,
            vec![TableActionKey::AddRecord, TableActionKey::SetField]
        );
    }

    #[tokio::test]
    async fn view_events_publish_without_buffering() {
        let (bus, dispatcher) = setup();
        let table = TableId::new("tblA");
        let view: Event = ViewEvent::new(
            EventName::ViewUpdated,
            table.clone(),
            ViewId::new("viwB"),
            json!({}),
            vec![],
        )
        .unwrap()
        .into();

        dispatcher.emit(view).await.unwrap();

        assert_eq!(bus.message_count(), 1);
        assert!(dispatcher.buffer().pending(&table).await.is_empty());
    }

    #[tokio::test]
    async fn failed_publish_is_returned_and_not_buffered() {
        let (bus, dispatcher) = setup();
        bus.set_unavailable(true);

        let err = dispatcher.emit(record_created("tblA")).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::PublishFailed);
        assert!(dispatcher.buffer().pending(&TableId::new("tblA")).await.is_empty());
    }

    #[tokio::test]
    async fn trigger_rejects_view_scope_keys() {
        let (bus, dispatcher) = setup();
        let table = TableId::new("tblA");

        dispatcher.trigger(&table, "addRecord").await.unwrap();
        let err = dispatcher.trigger(&table, "applyViewFilter").await.unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidActionKey);
        assert_eq!(
            dispatcher.buffer().pending(&table).await,
            vec![TableActionKey::AddRecord]
        );
        assert_eq!(bus.message_count(), 0);
    }

    #[tokio::test]
    async fn empty_table_id_is_rejected_before_publish() {
        let (bus, dispatcher) = setup();

        let err = dispatcher.emit(record_created("")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert!(err.message.contains("tableId"));

        let err = dispatcher
            .trigger(&TableId::new(""), "addRecord")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        assert_eq!(bus.message_count(), 0);
        assert_eq!(dispatcher.buffer().table_count().await, 0);
    }

    #[tokio::test]
    async fn empty_user_id_is_rejected() {
        let (bus, dispatcher) = setup();
        let user = UserId::new("");

        let err = dispatcher
            .notify_user(
                &user,
                UserNotification::new(user.clone(), NotificationType::System, "hi"),
            )
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(bus.message_count(), 0);
    }

    #[tokio::test]
    async fn realtime_core_shares_one_buffer() {
        let bus = Arc::new(InMemoryChannelBus::new());
        let (dispatcher, flusher) = realtime_core(bus.clone(), &RealtimeConfig::default());
        let table = TableId::new("tblA");

        dispatcher.trigger(&table, "addRecord").await.unwrap();
        dispatcher.trigger(&table, "addRecord").await.unwrap();

        assert_eq!(flusher.flush_once().await.unwrap(), 1);
        assert_eq!(bus.messages_on(&action_trigger_channel(&table)).len(), 1);
    }

    #[tokio::test]
    async fn notify_user_publishes_on_notification_channel() {
        let (bus, dispatcher) = setup();
        let user = UserId::new("usrA");

        dispatcher
            .notify_user(
                &user,
                UserNotification::new(user.clone(), NotificationType::System, "Import finished"),
            )
            .await
            .unwrap();

        let messages = bus.messages_on(&notification_channel(&user));
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind(), "notification");
    }
}
