//! In-memory channel bus for testing.
//!
//! Provides synchronous, deterministic delivery for unit tests.
//!
//! # Note
//!
//! This adapter is for **testing and single-process setups** only. A
//! poisoned lock is recovered rather than propagated, since the guarded
//! data is append-only.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::realtime::{Channel, ChannelMessage};
use crate::ports::{ChannelHandler, ChannelPublisher, ChannelSubscriber};

/// In-memory channel bus.
///
/// Features:
/// - Synchronous delivery (deterministic for tests)
/// - Message capture for assertions
/// - Handler registration and invocation
/// - Simulated transport outage via [`InMemoryChannelBus::set_unavailable`]
///
/// # Example
///
/// ```ignore
/// let bus = Arc::new(InMemoryChannelBus::new());
/// bus.publish(&channel, message).await?;
/// assert_eq!(bus.messages_on(&channel).len(), 1);
/// ```
pub struct InMemoryChannelBus {
    handlers: RwLock<HashMap<Channel, Vec<Arc<dyn ChannelHandler>>>>,
    published: RwLock<Vec<(Channel, ChannelMessage)>>,
    unavailable: AtomicBool,
}

impl InMemoryChannelBus {
    /// Creates a new empty bus.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            published: RwLock::new(Vec::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    // === Test Helpers ===

    /// Returns every published `(channel, message)` pair in publish order.
    pub fn published(&self) -> Vec<(Channel, ChannelMessage)> {
        read(&self.published).clone()
    }

    /// Returns messages published on a specific channel.
    pub fn messages_on(&self, channel: &Channel) -> Vec<ChannelMessage> {
        read(&self.published)
            .iter()
            .filter(|(c, _)| c == channel)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Returns count of published messages.
    pub fn message_count(&self) -> usize {
        read(&self.published).len()
    }

    /// Clears all published messages (for test isolation).
    pub fn clear(&self) {
        write(&self.published).clear();
    }

    /// Makes every subsequent publish fail with `PublishFailed`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

impl Default for InMemoryChannelBus {
    fn default() -> Self {
        Self::new()
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl ChannelPublisher for InMemoryChannelBus {
    async fn publish(&self, channel: &Channel, message: ChannelMessage) -> Result<(), DomainError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::new(ErrorCode::PublishFailed, "In-memory bus unavailable")
                .with_detail("channel", channel.as_str()));
        }

        // Store for test assertions
        write(&self.published).push((channel.clone(), message.clone()));

        // Clone handlers to release lock before await points
        let channel_handlers: Vec<Arc<dyn ChannelHandler>> =
            read(&self.handlers).get(channel).cloned().unwrap_or_default();

        let mut errors = Vec::new();
        for handler in channel_handlers {
            if let Err(e) = handler.handle(channel, message.clone()).await {
                errors.push(format!("{}: {}", handler.name(), e));
            }
        }

        if !errors.is_empty() {
            return Err(DomainError::new(
                ErrorCode::InternalError,
                format!("Handler errors: {}", errors.join(", ")),
            ));
        }

        Ok(())
    }
}

impl ChannelSubscriber for InMemoryChannelBus {
    fn subscribe(&self, channel: &Channel, handler: Arc<dyn ChannelHandler>) {
        write(&self.handlers)
            .entry(channel.clone())
            .or_default()
            .push(handler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::TableId;
    use crate::domain::realtime::{
        action_trigger_channel, collaborator_channel, ActionTrigger, TableActionKey,
    };
    use std::sync::atomic::AtomicUsize;

    fn trigger(table: &str) -> ChannelMessage {
        ActionTrigger {
            table_id: TableId::new(table),
            actions: vec![TableActionKey::AddRecord],
        }
        .into()
    }

    fn channel(table: &str) -> Channel {
        action_trigger_channel(&TableId::new(table))
    }

    struct CountingHandler(Arc<AtomicUsize>);

    #[async_trait]
    impl ChannelHandler for CountingHandler {
        async fn handle(&self, _: &Channel, _: ChannelMessage) -> Result<(), DomainError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn name(&self) -> &'static str {
            "CountingHandler"
        }
    }

    #[tokio::test]
    async fn publish_stores_message() {
        let bus = InMemoryChannelBus::new();

        bus.publish(&channel("tblA"), trigger("tblA")).await.unwrap();

        assert_eq!(bus.message_count(), 1);
        assert_eq!(bus.messages_on(&channel("tblA")).len(), 1);
    }

    #[tokio::test]
    async fn messages_on_filters_by_channel() {
        let bus = InMemoryChannelBus::new();

        bus.publish(&channel("tblA"), trigger("tblA")).await.unwrap();
        bus.publish(&channel("tblB"), trigger("tblB")).await.unwrap();
        bus.publish(&channel("tblA"), trigger("tblA")).await.unwrap();

        assert_eq!(bus.messages_on(&channel("tblA")).len(), 2);
        assert!(bus
            .messages_on(&collaborator_channel(&TableId::new("tblA")))
            .is_empty());
    }

    #[tokio::test]
    async fn handlers_only_see_their_channel() {
        let bus = InMemoryChannelBus::new();
        let counter = Arc::new(AtomicUsize::new(0));

        bus.subscribe_all(
            &[channel("tblA"), channel("tblB")],
            Arc::new(CountingHandler(counter.clone())),
        );

        bus.publish(&channel("tblA"), trigger("tblA")).await.unwrap();
        bus.publish(&channel("tblB"), trigger("tblB")).await.unwrap();
        bus.publish(&channel("tblC"), trigger("tblC")).await.unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn publish_all_keeps_order() {
        let bus = InMemoryChannelBus::new();

        bus.publish_all(vec![
            (channel("tblB"), trigger("tblB")),
            (channel("tblA"), trigger("tblA")),
        ])
        .await
        .unwrap();

        let published = bus.published();
        assert_eq!(published[0].0, channel("tblB"));
        assert_eq!(published[1].0, channel("tblA"));
    }

    #[tokio::test]
    async fn unavailable_bus_rejects_publish() {
        let bus = InMemoryChannelBus::new();
        bus.set_unavailable(true);

        let err = bus.publish(&channel("tblA"), trigger("tblA")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PublishFailed);
        assert_eq!(bus.message_count(), 0);
    }

    #[tokio::test]
    async fn handler_error_is_propagated() {
        let bus = InMemoryChannelBus::new();

        struct FailingHandler;

        #[async_trait]
        impl ChannelHandler for FailingHandler {
            async fn handle(&self, _: &Channel, _: ChannelMessage) -> Result<(), DomainError> {
                Err(DomainError::new(ErrorCode::InternalError, "Handler failed"))
            }
            fn name(&self) -> &'static str {
                "FailingHandler"
            }
        }

        bus.subscribe(&channel("tblA"), Arc::new(FailingHandler));
        let result = bus.publish(&channel("tblA"), trigger("tblA")).await;

        assert!(result.unwrap_err().message.contains("FailingHandler"));
    }

    #[tokio::test]
    async fn clear_removes_all_messages() {
        let bus = InMemoryChannelBus::new();
        bus.publish(&channel("tblA"), trigger("tblA")).await.unwrap();

        bus.clear();

        assert_eq!(bus.message_count(), 0);
    }
}
