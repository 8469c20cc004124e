//! Filegate Core Library
//!
//! This crate provides the domain models, error types, configuration, and
//! file policy tables shared by every Filegate component.

pub mod config;
pub mod error;
pub mod models;
pub mod policy;

// Re-export commonly used types
pub use config::{GateConfig, HashAlgorithm, ScannerConfig, SecuritySettings};
pub use error::{ErrorMetadata, GateError, LogLevel};
pub use models::{
    AccessAction, AuditAction, AuditEvent, Category, FileMetadata, ScanResult, ScanStatus,
    SecurityVerdict, UploadScreening, ValidationResult,
};
pub use policy::{FilePolicy, MagicNumber};
