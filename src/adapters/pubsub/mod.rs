//! Channel transports.
//!
//! - [`InMemoryChannelBus`] - test and single-process bus
//! - [`RedisChannelPublisher`] - `PUBLISH` for multi-server fan-out
//! - [`RedisRoomRelay`] - Redis pattern subscription feeding local rooms

mod in_memory;
mod redis_publisher;
mod redis_relay;

pub use in_memory::InMemoryChannelBus;
pub use redis_publisher::RedisChannelPublisher;
pub use redis_relay::RedisRoomRelay;
