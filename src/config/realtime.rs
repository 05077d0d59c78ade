//! Realtime delivery configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

const MAX_COALESCE_WINDOW_MS: u64 = 10_000;

/// Realtime configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Length of one action-trigger coalescing window in milliseconds
    #[serde(default = "default_coalesce_window_ms")]
    pub coalesce_window_ms: u64,

    /// Broadcast buffer per room; slower subscribers lag past this
    #[serde(default = "default_room_capacity")]
    pub room_capacity: usize,
}

impl RealtimeConfig {
    /// Get the coalescing window as Duration
    pub fn coalesce_window(&self) -> Duration {
        Duration::from_millis(self.coalesce_window_ms)
    }

    /// Validate realtime configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.coalesce_window_ms == 0 || self.coalesce_window_ms > MAX_COALESCE_WINDOW_MS {
            return Err(ValidationError::InvalidCoalesceWindow);
        }
        if self.room_capacity == 0 {
            return Err(ValidationError::InvalidRoomCapacity);
        }
        Ok(())
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            coalesce_window_ms: default_coalesce_window_ms(),
            room_capacity: default_room_capacity(),
        }
    }
}

fn default_coalesce_window_ms() -> u64 {
    50
}

fn default_room_capacity() -> usize {
    128
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_realtime_config_defaults() {
        let config = RealtimeConfig::default();
        assert_eq!(config.coalesce_window(), Duration::from_millis(50));
        assert_eq!(config.room_capacity, 128);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_zero_window() {
        let config = RealtimeConfig {
            coalesce_window_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidCoalesceWindow)
        ));
    }

    #[test]
    fn test_validation_window_too_long() {
        let config = RealtimeConfig {
            coalesce_window_ms: 60_000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_capacity() {
        let config = RealtimeConfig {
            room_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidRoomCapacity)
        ));
    }
}
