//! Filegate Infrastructure
//!
//! Process-level plumbing shared by the binaries: tracing subscriber setup.

pub mod telemetry;

pub use telemetry::{init_telemetry, shutdown_telemetry, LogFormat};
