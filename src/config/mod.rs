//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `SHEETCAST` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use sheetcast::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Coalescing every {:?}", config.realtime.coalesce_window());
//! ```

mod error;
mod realtime;
mod redis;
mod server;

pub use error::{ConfigError, ValidationError};
pub use realtime::RealtimeConfig;
pub use redis::RedisConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a runnable
/// single-process server. Load using [`AppConfig::load()`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, log filter)
    #[serde(default)]
    pub server: ServerConfig,

    /// Coalescing window and room sizing
    #[serde(default)]
    pub realtime: RealtimeConfig,

    /// Redis fan-out; rooms in this process are used when absent
    #[serde(default)]
    pub redis: Option<RedisConfig>,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `SHEETCAST` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `SHEETCAST__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `SHEETCAST__REALTIME__COALESCE_WINDOW_MS=100` -> `realtime.coalesce_window_ms = 100`
    /// - `SHEETCAST__REDIS__URL=redis://...` -> `redis.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("SHEETCAST")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.realtime.validate()?;
        if let Some(redis) = &self.redis {
            redis.validate()?;
        }
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "SHEETCAST__SERVER__PORT",
        "SHEETCAST__SERVER__ENVIRONMENT",
        "SHEETCAST__REALTIME__COALESCE_WINDOW_MS",
        "SHEETCAST__REALTIME__ROOM_CAPACITY",
        "SHEETCAST__REDIS__URL",
    ];

    /// Helper to clear environment variables after testing
    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn load_with(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        clear_env();
        for (key, value) in vars {
            env::set_var(key, value);
        }
        let result = AppConfig::load();
        clear_env();
        result
    }

    #[test]
    fn test_load_defaults_from_empty_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[]).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.realtime.coalesce_window_ms, 50);
        assert_eq!(config.realtime.room_capacity, 128);
        assert!(config.redis.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_realtime_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[
            ("SHEETCAST__REALTIME__COALESCE_WINDOW_MS", "250"),
            ("SHEETCAST__REALTIME__ROOM_CAPACITY", "16"),
        ])
        .unwrap();

        assert_eq!(config.realtime.coalesce_window_ms, 250);
        assert_eq!(config.realtime.room_capacity, 16);
    }

    #[test]
    fn test_redis_section_is_loaded() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[("SHEETCAST__REDIS__URL", "redis://localhost:6379")]).unwrap();

        let redis = config.redis.as_ref().unwrap();
        assert_eq!(redis.url, "redis://localhost:6379");
        assert_eq!(redis.timeout_secs, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_redis_url_fails_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[("SHEETCAST__REDIS__URL", "http://localhost:6379")]).unwrap();

        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidRedisUrl)
        ));
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[("SHEETCAST__SERVER__ENVIRONMENT", "production")]).unwrap();
        assert!(config.is_production());
    }

    #[test]
    fn test_custom_server_port() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[("SHEETCAST__SERVER__PORT", "3000")]).unwrap();
        assert_eq!(config.server.port, 3000);
    }
}
