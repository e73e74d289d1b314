//! Top-level facade crate for gaugeboard.
//!
//! Re-exports the domain core and the gateway library so users can depend on a single crate.

pub mod core {
    pub use gaugeboard_core::*;
}

pub mod gateway {
    pub use gaugeboard_gateway::*;
}
