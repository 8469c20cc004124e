//! Upload validation engine
//!
//! Pure checks over file metadata and content bytes. Nothing in this crate
//! performs I/O; the tables it consults come from a `FilePolicy` handed to
//! the validator at construction time.

pub mod filename;
pub mod format;
pub mod validator;

pub use filename::{check_filename, sanitize_filename, split_extension};
pub use format::format_bytes;
pub use validator::{FileValidator, ValidationError, SPOOFING_WARNING};
