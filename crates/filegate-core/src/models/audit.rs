use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Audit event types for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    UploadSuccess,
    UploadFailed,
    FileAccessed,
    FileDeleted,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::UploadSuccess => "upload_success",
            AuditAction::UploadFailed => "upload_failed",
            AuditAction::FileAccessed => "file_accessed",
            AuditAction::FileDeleted => "file_deleted",
        }
    }
}

impl Display for AuditAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Structured audit record, written once and handed to the audit sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    pub file_id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl AuditEvent {
    pub fn new(
        action: AuditAction,
        file_id: impl Into<String>,
        user_id: impl Into<String>,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            action,
            file_id: file_id.into(),
            user_id: user_id.into(),
            metadata,
        }
    }

    /// Whether this event records a rejected operation.
    pub fn is_failure(&self) -> bool {
        self.action == AuditAction::UploadFailed
            || self.metadata.get("granted") == Some(&Value::Bool(false))
    }
}
