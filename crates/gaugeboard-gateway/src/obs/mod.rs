//! Lightweight in-process exposition (dependency-free).
//!
//! Live registry metrics and gateway counters are rendered straight into the
//! Prometheus text format by the `/metrics` handler; no external metrics
//! crate is involved.

pub mod exposition;
