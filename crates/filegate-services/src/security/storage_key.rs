use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Object key for a stored upload: `files/YYYY/MM/DD/<uuid>-<name>`.
///
/// `sanitized_name` must already be sanitized; it is used as is.
pub fn storage_key(file_id: Uuid, sanitized_name: &str, uploaded_at: DateTime<Utc>) -> String {
    format!(
        "files/{}/{}-{}",
        uploaded_at.format("%Y/%m/%d"),
        file_id,
        sanitized_name
    )
}
