//! ChannelSubscriber port - Interface for listening on channels.
//!
//! In-process consumers (bridges, test probes) register a handler for a
//! channel and receive every message published on it.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::DomainError;
use crate::domain::realtime::{Channel, ChannelMessage};

/// Handler for messages published on a channel.
///
/// Implementations should be:
/// - **Quick** - Long operations should be queued for async processing
/// - **Isolated** - Errors don't affect other handlers
#[async_trait]
pub trait ChannelHandler: Send + Sync {
    /// Process a message published on `channel`.
    async fn handle(&self, channel: &Channel, message: ChannelMessage) -> Result<(), DomainError>;

    /// Handler name for logging.
    fn name(&self) -> &'static str;
}

/// Port for subscribing to channels.
pub trait ChannelSubscriber: Send + Sync {
    /// Subscribe handler to a channel.
    fn subscribe(&self, channel: &Channel, handler: Arc<dyn ChannelHandler>);

    /// Subscribe the same handler to several channels.
    fn subscribe_all(&self, channels: &[Channel], handler: Arc<dyn ChannelHandler>) {
        for channel in channels {
            self.subscribe(channel, Arc::clone(&handler));
        }
    }
}
