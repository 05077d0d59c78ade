//! Relay from Redis pub/sub into this node's WebSocket rooms.
//!
//! Every node publishes through [`RedisChannelPublisher`](super::RedisChannelPublisher)
//! and runs one relay. The relay pattern-subscribes to all realtime
//! channels and rebroadcasts each message to the local room with the same
//! name, so a client receives a message no matter which node produced it.
//!
//! ```text
//! dispatcher ──PUBLISH──► Redis ──PMESSAGE──► RedisRoomRelay ──► RoomManager
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::watch;

use crate::adapters::websocket::RoomManager;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::realtime::{Channel, ChannelMessage};

/// Pattern matching every channel namespace.
const CHANNEL_PATTERN: &str = "__*";

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Background task feeding Redis messages into local rooms.
pub struct RedisRoomRelay {
    client: redis::Client,
    room_manager: Arc<RoomManager>,
    connect_timeout: Duration,
}

impl RedisRoomRelay {
    /// # Errors
    ///
    /// `CacheError` if the URL cannot be parsed.
    pub fn new(url: &str, room_manager: Arc<RoomManager>) -> Result<Self, DomainError> {
        let client = redis::Client::open(url)
            .map_err(|e| DomainError::new(ErrorCode::CacheError, e.to_string()))?;
        Ok(Self {
            client,
            room_manager,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        })
    }

    /// Bound on establishing the subscription connection.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Relay messages until shutdown or until the subscription ends.
    ///
    /// # Errors
    ///
    /// `CacheError` if the subscription cannot be established within the
    /// connect timeout or Redis closes it before shutdown.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), DomainError> {
        let conn = tokio::time::timeout(self.connect_timeout, self.client.get_async_connection())
            .await
            .map_err(|_| DomainError::new(ErrorCode::CacheError, "Redis connection timed out"))?
            .map_err(cache_error)?;
        let mut pubsub = conn.into_pubsub();
        pubsub.psubscribe(CHANNEL_PATTERN).await.map_err(cache_error)?;
        tracing::info!(pattern = CHANNEL_PATTERN, "Redis room relay subscribed");

        let mut messages = Box::pin(pubsub.on_message());
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Redis room relay stopped");
                        return Ok(());
                    }
                }

                next = messages.next() => {
                    let Some(msg) = next else {
                        return Err(DomainError::new(
                            ErrorCode::CacheError,
                            "Redis subscription closed",
                        ));
                    };
                    let payload: String = match msg.get_payload() {
                        Ok(payload) => payload,
                        Err(e) => {
                            tracing::warn!(error = %e, "Dropping non-text Redis payload");
                            continue;
                        }
                    };
                    self.relay(msg.get_channel_name(), &payload).await;
                }
            }
        }
    }

    /// Rebroadcasts one raw Redis message. Malformed input is logged and
    /// skipped so one bad publisher cannot stall the relay.
    async fn relay(&self, raw_channel: &str, payload: &str) -> usize {
        let channel: Channel = match raw_channel.parse() {
            Ok(channel) => channel,
            Err(e) => {
                tracing::warn!(channel = raw_channel, error = %e, "Ignoring unknown channel");
                return 0;
            }
        };
        let message = match ChannelMessage::from_json(payload) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(channel = %channel, error = %e, "Ignoring undecodable message");
                return 0;
            }
        };
        self.room_manager.broadcast(&channel, message).await
    }
}

fn cache_error(e: redis::RedisError) -> DomainError {
    DomainError::new(ErrorCode::CacheError, e.to_string())
}
