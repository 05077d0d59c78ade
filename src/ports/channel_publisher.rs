//! ChannelPublisher port - The dispatch boundary of the realtime layer.
//!
//! This port defines how the core hands `(channel, message)` pairs to the
//! transport without knowing about delivery (in-memory, Redis, WebSocket).
//! Subscriber management, back-pressure and reconnection belong to the
//! implementation.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::realtime::{Channel, ChannelMessage};

/// Port for publishing messages to a named channel.
///
/// The core only calls this with a channel produced by the naming functions
/// and a message built from a serialized envelope, an action trigger or a
/// notification.
///
/// Implementations must propagate delivery errors to the caller; the core
/// never retries.
///
/// # Example
///
/// ```ignore
/// let channel = action_trigger_channel(&table_id);
/// publisher.publish(&channel, serialize_event(&event)?.into()).await?;
/// ```
#[async_trait]
pub trait ChannelPublisher: Send + Sync {
    /// Publish a single message on a channel.
    async fn publish(&self, channel: &Channel, message: ChannelMessage) -> Result<(), DomainError>;

    /// Publish several messages in order.
    ///
    /// Stops at the first failure, which is returned.
    async fn publish_all(
        &self,
        messages: Vec<(Channel, ChannelMessage)>,
    ) -> Result<(), DomainError> {
        for (channel, message) in messages {
            self.publish(&channel, message).await?;
        }
        Ok(())
    }
}
