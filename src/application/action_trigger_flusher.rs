//! ActionTriggerFlusher - Background service closing coalescing windows.
//!
//! Every window the flusher drains the [`ActionTriggerBuffer`] and
//! publishes one [`ActionTrigger`](crate::domain::realtime::ActionTrigger)
//! per dirty table on that table's action-trigger channel.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `window` | 50ms | Length of one coalescing window, at least 1ms |
//!
//! ## Graceful Shutdown
//!
//! The service listens for a shutdown signal and flushes once more before
//! stopping, so keys buffered in the last window are not lost.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use crate::domain::foundation::DomainError;
use crate::domain::realtime::{action_trigger_channel, ActionTriggerBuffer};
use crate::ports::ChannelPublisher;

/// Shortest window the flusher will tick at.
pub const MIN_WINDOW: Duration = Duration::from_millis(1);

/// Configuration for the ActionTriggerFlusher service.
#[derive(Debug, Clone)]
pub struct ActionTriggerFlusherConfig {
    /// How long keys coalesce before being published.
    pub window: Duration,
}

impl Default for ActionTriggerFlusherConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(50),
        }
    }
}

impl ActionTriggerFlusherConfig {
    /// Sets the window, raised to [`MIN_WINDOW`] if shorter.
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window.max(MIN_WINDOW);
        self
    }
}

/// Background service that publishes coalesced action triggers.
pub struct ActionTriggerFlusher {
    buffer: Arc<ActionTriggerBuffer>,
    publisher: Arc<dyn ChannelPublisher>,
    config: ActionTriggerFlusherConfig,
}

impl ActionTriggerFlusher {
    pub fn new(buffer: Arc<ActionTriggerBuffer>, publisher: Arc<dyn ChannelPublisher>) -> Self {
        Self::with_config(buffer, publisher, ActionTriggerFlusherConfig::default())
    }

    /// `config.window` is raised to [`MIN_WINDOW`] if shorter.
    pub fn with_config(
        buffer: Arc<ActionTriggerBuffer>,
        publisher: Arc<dyn ChannelPublisher>,
        mut config: ActionTriggerFlusherConfig,
    ) -> Self {
        config.window = config.window.max(MIN_WINDOW);
        Self {
            buffer,
            publisher,
            config,
        }
    }

    /// Run the flush loop until the shutdown signal is received.
    ///
    /// A failed flush is logged and the loop keeps going. Only the final
    /// flush on shutdown returns its error.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), DomainError> {
        let mut interval = time::interval(self.config.window);
        tracing::info!(window_ms = self.config.window.as_millis() as u64, "Action trigger flusher started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        self.flush_once().await?;
                        tracing::info!("Action trigger flusher stopped");
                        return Ok(());
                    }
                }

                _ = interval.tick() => {
                    if let Err(e) = self.flush_once().await {
                        tracing::warn!(error = %e, "Action trigger flush failed");
                    }
                }
            }
        }
    }

    /// Drains the buffer and publishes every pending trigger.
    ///
    /// Returns how many triggers were published. Every trigger is
    /// attempted. If any publish fails, the first error is returned after
    /// the rest have been tried; the failed table's keys are not re-buffered.
    pub async fn flush_once(&self) -> Result<usize, DomainError> {
        let triggers = self.buffer.drain_all().await;
        let mut published = 0;
        let mut first_error = None;

        for trigger in triggers {
            let channel = action_trigger_channel(&trigger.table_id);
            let actions = trigger.actions.len();
            match self.publisher.publish(&channel, trigger.into()).await {
                Ok(()) => {
                    tracing::debug!(channel = %channel, actions, "Published action trigger");
                    published += 1;
                }
                Err(e) => {
                    tracing::warn!(channel = %channel, error = %e, "Failed to publish action trigger");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(published),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::pubsub::InMemoryChannelBus;
    use crate::domain::foundation::{ErrorCode, TableId};
    use crate::domain::realtime::{ChannelMessage, TableActionKey};

    fn setup() -> (Arc<ActionTriggerBuffer>, Arc<InMemoryChannelBus>, ActionTriggerFlusher) {
        let buffer = Arc::new(ActionTriggerBuffer::new());
        let bus = Arc::new(InMemoryChannelBus::new());
        let flusher = ActionTriggerFlusher::new(buffer.clone(), bus.clone());
        (buffer, bus, flusher)
    }

    #[tokio::test]
    async fn flush_once_publishes_one_trigger_per_table() {
        let (buffer, bus, flusher) = setup();
        let table = TableId::new("tblA");

        buffer.push(&table, "addRecord").await.unwrap();
        buffer.push(&table, "addRecord").await.unwrap();
        buffer.push(&table, "setField").await.unwrap();
        buffer.push(&TableId::new("tblB"), "deleteRecord").await.unwrap();

        assert_eq!(flusher.flush_once().await.unwrap(), 2);

        let messages = bus.messages_on(&action_trigger_channel(&table));
        assert_eq!(messages.len(), 1);
        match &messages[0] {
            ChannelMessage::ActionTrigger(trigger) => assert_eq!(
                trigger.actions,
                vec![TableActionKey::AddRecord, TableActionKey::SetField]
            ),
            other => panic!("expected action trigger, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_buffer_publishes_nothing() {
        let (_buffer, bus, flusher) = setup();
        assert_eq!(flusher.flush_once().await.unwrap(), 0);
        assert_eq!(bus.message_count(), 0);
    }

    #[tokio::test]
    async fn publish_failure_is_returned() {
        let (buffer, bus, flusher) = setup();
        buffer.push_key(&TableId::new("tblA"), TableActionKey::SetRecord).await;
        bus.set_unavailable(true);

        let err = flusher.flush_once().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PublishFailed);
    }

    #[test]
    fn with_window_raises_zero_to_minimum() {
        let config = ActionTriggerFlusherConfig::default().with_window(Duration::ZERO);
        assert_eq!(config.window, MIN_WINDOW);
    }

    #[tokio::test]
    async fn zero_window_from_struct_literal_still_runs() {
        let buffer = Arc::new(ActionTriggerBuffer::new());
        let bus = Arc::new(InMemoryChannelBus::new());
        let flusher = ActionTriggerFlusher::with_config(
            buffer.clone(),
            bus.clone(),
            ActionTriggerFlusherConfig {
                window: Duration::ZERO,
            },
        );
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move { flusher.run(shutdown_rx).await });
        buffer.push_key(&TableId::new("tblA"), TableActionKey::SetRecord).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown_tx.send(true).unwrap();

        handle.await.unwrap().unwrap();
        assert_eq!(bus.message_count(), 1);
    }

    #[tokio::test]
    async fn run_flushes_on_shutdown() {
        let buffer = Arc::new(ActionTriggerBuffer::new());
        let bus = Arc::new(InMemoryChannelBus::new());
        let flusher = ActionTriggerFlusher::with_config(
            buffer.clone(),
            bus.clone(),
            ActionTriggerFlusherConfig::default().with_window(Duration::from_secs(3600)),
        );
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move { flusher.run(shutdown_rx).await });
        // Let the immediate first tick pass so the key lands in the final flush.
        tokio::time::sleep(Duration::from_millis(20)).await;
        buffer.push_key(&TableId::new("tblA"), TableActionKey::AddField).await;
        shutdown_tx.send(true).unwrap();

        handle.await.unwrap().unwrap();
        assert_eq!(bus.message_count(), 1);
    }
}
