//! Domain layer containing the realtime contract and its primitives.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors)
//! - `realtime` - Channel naming, event taxonomy, envelopes, action triggers

pub mod foundation;
pub mod realtime;
