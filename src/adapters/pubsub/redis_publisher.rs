//! Redis-backed channel publisher for multi-server deployments.
//!
//! Every message is encoded as JSON text and sent with `PUBLISH
//! <channel> <json>`, so gateways on any node subscribed to the same
//! channel receive it.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::realtime::{Channel, ChannelMessage};
use crate::ports::ChannelPublisher;

/// Publishes channel messages through Redis pub/sub.
#[derive(Clone)]
pub struct RedisChannelPublisher {
    conn: MultiplexedConnection,
}

impl RedisChannelPublisher {
    /// Wraps an existing multiplexed connection.
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }

    /// Opens a multiplexed connection to `url`.
    ///
    /// # Errors
    ///
    /// `CacheError` if the URL is invalid or the server is unreachable.
    pub async fn connect(url: &str) -> Result<Self, DomainError> {
        let client = redis::Client::open(url).map_err(cache_error)?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(cache_error)?;
        Ok(Self::new(conn))
    }
}

fn cache_error(e: redis::RedisError) -> DomainError {
    DomainError::new(ErrorCode::CacheError, e.to_string())
}

#[async_trait]
impl ChannelPublisher for RedisChannelPublisher {
    async fn publish(&self, channel: &Channel, message: ChannelMessage) -> Result<(), DomainError> {
        let payload = message.to_json()?;
        let mut conn = self.conn.clone();

        let receivers: i64 = conn
            .publish(channel.as_str(), payload)
            .await
            .map_err(|e: redis::RedisError| {
                DomainError::new(ErrorCode::PublishFailed, e.to_string())
                    .with_detail("channel", channel.as_str())
            })?;

        tracing::debug!(
            channel = %channel,
            kind = message.kind(),
            receivers,
            "Published to Redis"
        );
        Ok(())
    }
}
