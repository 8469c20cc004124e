//! Error types module
//!
//! Errors that cross the core boundary. Validation failures and infections are
//! never errors: they are carried as fields of `ValidationResult` and
//! `SecurityVerdict`. What remains here are configuration problems, denied
//! access, and internal failures.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like bad input
    Debug,
    /// Warning level - for rejected requests
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented.
/// The HTTP layer consuming this crate maps errors through this trait without
/// matching on variants.
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "ACCESS_DENIED")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Access denied: {action} on file {file_id}")]
    AccessDenied { file_id: String, action: String },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for GateError {
    fn from(err: anyhow::Error) -> Self {
        GateError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for GateError {
    fn from(err: serde_json::Error) -> Self {
        GateError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for GateError {
    fn from(err: uuid::Error) -> Self {
        GateError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, log_level).
fn gate_error_static_metadata(err: &GateError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        GateError::InvalidInput(_) => (400, "INVALID_INPUT", false, LogLevel::Debug),
        GateError::Config(_) => (500, "CONFIGURATION_ERROR", false, LogLevel::Error),
        GateError::AccessDenied { .. } => (403, "ACCESS_DENIED", false, LogLevel::Warn),
        GateError::Internal(_) | GateError::InternalWithSource { .. } => {
            (500, "INTERNAL_ERROR", true, LogLevel::Error)
        }
    }
}

impl GateError {
    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for GateError {
    fn http_status_code(&self) -> u16 {
        gate_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        gate_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        gate_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        gate_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            GateError::InvalidInput(ref msg) => msg.clone(),
            GateError::Config(_) => "Service is misconfigured".to_string(),
            GateError::AccessDenied { .. } => "Access denied".to_string(),
            GateError::Internal(_) | GateError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}
