//! WebSocket message types for the realtime gateway.
//!
//! Defines the protocol between server and connected clients:
//! - Server → Client: Connection status, subscription acks, channel messages, errors, pongs
//! - Client → Server: Subscribe, unsubscribe, pings

use serde::{Deserialize, Serialize};

use crate::domain::realtime::{Channel, ChannelMessage};

// ============================================
// Server → Client Messages
// ============================================

/// All message types that can be sent from server to client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection established successfully.
    Connected(ConnectedMessage),

    /// Client joined a channel.
    Subscribed(SubscriptionMessage),

    /// Client left a channel.
    Unsubscribed(SubscriptionMessage),

    /// Something was published on a subscribed channel.
    Message(ChannelDeliveryMessage),

    /// Error occurred.
    Error(ErrorMessage),

    /// Heartbeat response.
    Pong(PongMessage),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedMessage {
    pub client_id: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionMessage {
    pub channel: Channel,
}

/// A channel message forwarded to a subscriber.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelDeliveryMessage {
    pub channel: Channel,
    pub data: ChannelMessage,
}

/// Error message sent to client.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessage {
    pub code: String,
    pub message: String,
    pub timestamp: String,
}

/// Heartbeat response.
#[derive(Debug, Clone, Serialize)]
pub struct PongMessage {
    pub timestamp: String,
}

// ============================================
// Client → Server Messages
// ============================================

/// All message types that can be received from client.
///
/// Channel names arrive as raw strings and are validated by the handler.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe { channel: String },
    Unsubscribe { channel: String },
    Ping,
}
