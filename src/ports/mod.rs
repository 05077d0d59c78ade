//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the realtime core and the transport. Adapters implement these ports.
//!
//! - `ChannelPublisher` - The `publish(channel, message)` dispatch boundary
//! - `ChannelSubscriber` - Registration of in-process channel handlers
//! - `ChannelHandler` - Handler that processes published messages

mod channel_publisher;
mod channel_subscriber;

pub use channel_publisher::ChannelPublisher;
pub use channel_subscriber::{ChannelHandler, ChannelSubscriber};
