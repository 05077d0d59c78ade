//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the realtime core to external systems:
//! - `pubsub` - Channel transports (in-memory, Redis)
//! - `websocket` - Rooms and the client-facing socket

pub mod pubsub;
pub mod websocket;

pub use pubsub::{InMemoryChannelBus, RedisChannelPublisher, RedisRoomRelay};
pub use websocket::{websocket_router, RoomManager, WebSocketState};
