//! WebSocket adapters for realtime channel delivery.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       RealtimeDispatcher                            │
//! │   publish(channel, message)                                         │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         RoomManager                                 │
//! │   Room: __action_trigger_tblA    Room: __notification_user_usrA     │
//! │   ├── client-a                   └── client-c                       │
//! │   └── client-b                                                      │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     ▼
//!                      ws_handler (one task per socket)
//! ```
//!
//! # Components
//!
//! - [`messages`] - WebSocket message protocol types
//! - [`rooms`] - Room management for channel-based routing
//! - [`handler`] - Axum WebSocket upgrade handler

pub mod handler;
pub mod messages;
pub mod rooms;

pub use handler::{websocket_router, ws_handler, WebSocketState};
pub use messages::{ClientMessage, ServerMessage};
pub use rooms::{ClientId, Delivery, RoomManager};
