use anyhow::Context;
use filegate_core::FileMetadata;
use filegate_services::SecurityService;
use serde::Serialize;
use std::path::Path;
use tokio::task::JoinHandle;

/// MIME type implied by a filename's extension, `application/octet-stream`
/// when unknown.
pub fn guess_mime_type(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Read a local file into upload metadata. The name defaults to the file's
/// own name and the MIME type to the one guessed from that name.
pub async fn load_upload(
    path: &Path,
    name: Option<String>,
    mime_type: Option<String>,
) -> anyhow::Result<FileMetadata> {
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let name = name.unwrap_or_else(|| {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    let mime_type = mime_type.unwrap_or_else(|| guess_mime_type(&name));

    Ok(FileMetadata::new(name, mime_type, content))
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

/// Close the audit queue by dropping the last service handle, then wait for
/// the writer to flush what is left.
pub async fn drain_audit(service: SecurityService, audit_writer: JoinHandle<()>) {
    drop(service);
    if let Err(e) = audit_writer.await {
        tracing::warn!(error = %e, "Audit writer did not finish cleanly");
    }
}
