//! gaugeboard gateway library entry.
//!
//! This crate wires the HTTP/WebSocket boundary, the YAML config, the
//! realtime fanout hub, and the text exposition endpoint into a cohesive
//! server stack. It is intended to be consumed by the binary (`main.rs`)
//! and by integration tests.

pub mod api;
pub mod app_state;
pub mod config;
pub mod obs;
pub mod realtime;
pub mod router;
pub mod transport;
