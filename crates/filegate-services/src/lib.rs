//! Filegate Services Layer
//!
//! Hosts the virus scanner adapter, the security orchestrator that turns an
//! upload into a verdict, and the audit emitter. Callers (an HTTP layer, the
//! CLI) depend on this crate and hand it `FileMetadata`; persistence and
//! storage I/O stay with them.

pub mod audit;
pub mod security;
pub mod services;

pub use audit::AuditLogger;
pub use security::{
    calculate_checksum, storage_key, AccessPolicy, AuthenticatedUserPolicy, SecurityService,
    UrlSigner,
};
#[cfg(feature = "clamav")]
pub use services::ClamAVScanner;
pub use services::{
    create_scanner, Detection, ScanError, ScannerHealth, ScannerStatus, UnavailableScanner,
    VirusScanner,
};
