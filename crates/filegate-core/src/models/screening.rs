use serde::Serialize;
use uuid::Uuid;

use super::{ScanStatus, SecurityVerdict};

/// Everything the caller needs after screening one upload: the verdict plus,
/// when it passed, the identifiers used to persist and store the file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadScreening {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<Uuid>,
    pub verdict: SecurityVerdict,
    /// Category name, or "unknown" for types outside the whitelist.
    pub category: String,
    pub checksum: String,
    pub sanitized_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
    pub scan_status: ScanStatus,
}

impl UploadScreening {
    pub fn passed(&self) -> bool {
        self.verdict.passed()
    }
}
