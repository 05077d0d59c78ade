//! WebSocket room management for channel-based message routing.
//!
//! Each channel is a room. A client may sit in many rooms at once, e.g.
//! the action-trigger channel of the table it shows plus its own
//! notification channel.
//!
//! ```text
//! Room: __action_trigger_tblA     Room: __notification_user_usrA
//! ├── client-a                    └── client-a
//! └── client-b
//! ```
//!
//! `RoomManager` implements [`ChannelPublisher`], so the dispatcher can
//! publish straight into the rooms of this process.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::domain::foundation::DomainError;
use crate::domain::realtime::{Channel, ChannelMessage};
use crate::ports::ChannelPublisher;

/// Unique identifier for a WebSocket client connection.
///
/// Generated server-side when a client connects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(Uuid);

impl ClientId {
    /// Create a new random client ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message delivered to a room, tagged with the room it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub channel: Channel,
    pub message: ChannelMessage,
}

/// Manages WebSocket rooms keyed by channel.
///
/// # Thread Safety
///
/// Uses `RwLock` for the room registry since broadcasts (reads) vastly
/// outnumber joins/leaves (writes).
pub struct RoomManager {
    /// Map of channel → broadcast sender for that room.
    rooms: RwLock<HashMap<Channel, broadcast::Sender<Delivery>>>,

    /// Map of client_id → channels joined, for cleanup on disconnect.
    client_channels: RwLock<HashMap<ClientId, HashSet<Channel>>>,

    /// Channel capacity for each room's broadcast channel.
    channel_capacity: usize,
}

impl RoomManager {
    /// Create a new room manager with specified channel capacity.
    ///
    /// Slow clients that fall more than `channel_capacity` messages behind
    /// miss the oldest ones.
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            client_channels: RwLock::new(HashMap::new()),
            channel_capacity: channel_capacity.max(1),
        }
    }

    /// Create with default capacity (128 messages).
    pub fn with_default_capacity() -> Self {
        Self::new(128)
    }

    /// Join a client to a channel room, creating the room if needed.
    ///
    /// Returns a receiver for every message later published on the channel.
    pub async fn join(&self, channel: &Channel, client_id: ClientId) -> broadcast::Receiver<Delivery> {
        let mut rooms = self.rooms.write().await;

        let sender = rooms.entry(channel.clone()).or_insert_with(|| {
            let (tx, _) = broadcast::channel(self.channel_capacity);
            tx
        });

        self.client_channels
            .write()
            .await
            .entry(client_id)
            .or_default()
            .insert(channel.clone());

        sender.subscribe()
    }

    /// Remove a client from one channel room.
    ///
    /// The caller must drop the room receiver first for the room to be
    /// cleaned up.
    pub async fn leave(&self, channel: &Channel, client_id: &ClientId) {
        {
            let mut client_channels = self.client_channels.write().await;
            if let Some(channels) = client_channels.get_mut(client_id) {
                channels.remove(channel);
                if channels.is_empty() {
                    client_channels.remove(client_id);
                }
            }
        }
        self.remove_if_empty(channel).await;
    }

    /// Remove a client from every room it joined.
    pub async fn leave_all(&self, client_id: &ClientId) {
        let channels = self
            .client_channels
            .write()
            .await
            .remove(client_id)
            .unwrap_or_default();

        for channel in channels {
            self.remove_if_empty(&channel).await;
        }
    }

    /// Broadcast a message to every client in a channel room.
    ///
    /// Returns the number of receivers reached. A channel without a room
    /// is a no-op.
    pub async fn broadcast(&self, channel: &Channel, message: ChannelMessage) -> usize {
        let delivered = {
            let rooms = self.rooms.read().await;
            match rooms.get(channel) {
                Some(sender) => sender.send(Delivery {
                    channel: channel.clone(),
                    message,
                }),
                None => return 0,
            }
        };

        match delivered {
            Ok(receivers) => receivers,
            Err(_) => {
                self.remove_if_empty(channel).await;
                0
            }
        }
    }

    /// Number of connected receivers in a room (0 if the room doesn't exist).
    pub async fn client_count(&self, channel: &Channel) -> usize {
        self.rooms
            .read()
            .await
            .get(channel)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }

    /// All active rooms (for monitoring/debugging).
    pub async fn active_rooms(&self) -> Vec<Channel> {
        self.rooms.read().await.keys().cloned().collect()
    }

    /// Total count of clients holding at least one room.
    pub async fn total_client_count(&self) -> usize {
        self.client_channels.read().await.len()
    }

    async fn remove_if_empty(&self, channel: &Channel) {
        let mut rooms = self.rooms.write().await;
        if rooms.get(channel).map(|s| s.receiver_count() == 0).unwrap_or(false) {
            rooms.remove(channel);
        }
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[async_trait]
impl ChannelPublisher for RoomManager {
    async fn publish(&self, channel: &Channel, message: ChannelMessage) -> Result<(), DomainError> {
        let kind = message.kind();
        let receivers = self.broadcast(channel, message).await;
        tracing::trace!(channel = %channel, kind, receivers, "Broadcast to room");
        Ok(())
    }
}
