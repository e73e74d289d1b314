//! Realtime fanout for connected sessions.

pub mod hub;

pub use hub::{SessionId, SyncHub};
