//! Security orchestration
//!
//! `SecurityService` combines the validator, the scanner and the audit
//! emitter into verdicts; the helpers here (checksums, signed URLs, access
//! policy, storage keys) are usable on their own.

pub mod access;
pub mod checksum;
pub mod service;
pub mod signed_url;
pub mod storage_key;

pub use access::{AccessPolicy, AuthenticatedUserPolicy};
pub use checksum::calculate_checksum;
pub use service::{SecurityService, SCAN_DISABLED_WARNING, SCAN_FAILED_WARNING};
pub use signed_url::UrlSigner;
pub use storage_key::storage_key;
