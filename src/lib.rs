//! Sheetcast - Realtime fan-out for a multi-tenant spreadsheet database.
//!
//! This crate names the realtime channels, serializes table, field, record
//! and view events into wire envelopes, coalesces fine-grained mutations
//! into per-table action triggers, and hands everything to a pluggable
//! channel transport.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
