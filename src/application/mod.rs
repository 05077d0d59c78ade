//! Application layer - services wiring the realtime domain to its ports.
//!
//! - [`RealtimeDispatcher`] - emits events, buffers action keys, notifies users
//! - [`ActionTriggerFlusher`] - publishes coalesced action triggers
//! - [`realtime_core`] - builds the two around one shared buffer

mod action_trigger_flusher;
mod realtime_dispatcher;

pub use action_trigger_flusher::{ActionTriggerFlusher, ActionTriggerFlusherConfig};
pub use realtime_dispatcher::{realtime_core, RealtimeDispatcher};
