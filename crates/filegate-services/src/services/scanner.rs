use async_trait::async_trait;
use filegate_core::{ErrorMetadata, LogLevel};
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

/// Reported when no engine was ever reached.
pub const VERSION_NOT_INITIALIZED: &str = "not initialized";
/// Reported when the engine is up but did not answer the version query.
pub const VERSION_UNKNOWN: &str = "unknown";

static DEGRADED_WARNED: AtomicBool = AtomicBool::new(false);

/// Outcome of a completed scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    Clean,
    /// Signature names reported by the engine
    Infected(Vec<String>),
}

impl Detection {
    pub fn is_infected(&self) -> bool {
        matches!(self, Detection::Infected(_))
    }

    pub fn viruses(&self) -> &[String] {
        match self {
            Detection::Clean => &[],
            Detection::Infected(viruses) => viruses,
        }
    }
}

/// A scan that started but did not produce a verdict.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Scan engine error: {0}")]
    Engine(String),

    #[error("Scan timed out after {0} seconds")]
    Timeout(u64),

    #[error("Scan I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scan task failed: {0}")]
    TaskFailed(String),

    #[error("Invalid scan engine response: {0}")]
    InvalidResponse(String),
}

impl ErrorMetadata for ScanError {
    fn http_status_code(&self) -> u16 {
        match self {
            ScanError::Timeout(_) => 504,
            _ => 503,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ScanError::Engine(_) => "SCAN_ENGINE_ERROR",
            ScanError::Timeout(_) => "SCAN_TIMEOUT",
            ScanError::Io(_) => "SCAN_UNAVAILABLE",
            ScanError::TaskFailed(_) => "SCAN_TASK_FAILED",
            ScanError::InvalidResponse(_) => "SCAN_INVALID_RESPONSE",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(self, ScanError::TaskFailed(_))
    }

    fn client_message(&self) -> String {
        "Virus scan could not be completed".to_string()
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::Error
    }
}

/// Virus scanning engine
///
/// Implementations are selected once at startup by `create_scanner`; the
/// orchestrator only ever sees this trait.
#[async_trait]
pub trait VirusScanner: Send + Sync {
    /// Scan an in-memory buffer.
    async fn scan(&self, content: &[u8]) -> Result<Detection, ScanError>;

    /// Scan a file the engine host can read.
    async fn scan_file(&self, path: &Path) -> Result<Detection, ScanError>;

    /// Engine version string, best effort.
    async fn engine_version(&self) -> String;

    /// Whether the engine currently answers.
    async fn is_available(&self) -> bool;
}

/// Scanner used when the engine could not be initialised or scanning is off.
///
/// Every scan reports `Clean` without error; the first one in the process
/// logs a degraded-mode warning.
#[derive(Debug, Clone)]
pub struct UnavailableScanner {
    reason: String,
}

impl UnavailableScanner {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    fn warn_degraded(&self) {
        if !DEGRADED_WARNED.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                reason = %self.reason,
                "Virus scanner not initialized, scans report clean (degraded mode)"
            );
        }
    }
}

#[async_trait]
impl VirusScanner for UnavailableScanner {
    async fn scan(&self, _content: &[u8]) -> Result<Detection, ScanError> {
        self.warn_degraded();
        Ok(Detection::Clean)
    }

    async fn scan_file(&self, _path: &Path) -> Result<Detection, ScanError> {
        self.warn_degraded();
        Ok(Detection::Clean)
    }

    async fn engine_version(&self) -> String {
        VERSION_NOT_INITIALIZED.to_string()
    }

    async fn is_available(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScannerStatus {
    Up,
    Down,
    Disabled,
}

/// Scanner health as reported to operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScannerHealth {
    pub status: ScannerStatus,
    pub version: String,
}
