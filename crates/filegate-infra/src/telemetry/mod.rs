//! Telemetry initialization
//!
//! Installs the global `tracing` subscriber. Audit events are emitted on the
//! `audit` target and are kept by the default filter.

mod init_basic;

pub use init_basic::{init_telemetry, shutdown_telemetry, LogFormat, DEFAULT_FILTER};
