//! Redis configuration
//!
//! Redis is optional. A single gateway needs none: the dispatcher publishes
//! straight into its `RoomManager`. In a multi-node deployment every
//! mutation node publishes through `RedisChannelPublisher` and every
//! gateway runs a `RedisRoomRelay` on the same server, so `url` must point
//! at the instance both sides share. `timeout_secs` bounds the relay's
//! subscription connect.
//!
//! Set with `SHEETCAST__REDIS__URL` (and optionally
//! `SHEETCAST__REDIS__TIMEOUT_SECS`); leaving the URL unset disables the
//! section entirely.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Shared Redis pub/sub instance for multi-node fan-out
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL
    pub url: String,

    /// Relay connect timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl RedisConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate Redis configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("REDIS__URL"));
        }
        if !self.url.starts_with("redis://") && !self.url.starts_with("rediss://") {
            return Err(ValidationError::InvalidRedisUrl);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidRedisTimeout);
        }
        Ok(())
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    5
}
