use chrono::Utc;
use filegate_core::{
    AccessAction, AuditAction, AuditEvent, FileMetadata, GateConfig, GateError, HashAlgorithm,
    ScanResult, ScanStatus, SecurityVerdict, SecuritySettings, UploadScreening,
};
use filegate_processing::{sanitize_filename, FileValidator};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::access::{AccessPolicy, AuthenticatedUserPolicy};
use super::checksum::calculate_checksum;
use super::signed_url::UrlSigner;
use super::storage_key::storage_key;
use crate::audit::AuditLogger;
use crate::services::{Detection, ScannerHealth, ScannerStatus, VirusScanner};

pub const SCAN_FAILED_WARNING: &str = "Virus scan failed, proceeding with caution";
pub const SCAN_DISABLED_WARNING: &str = "Virus scanning is disabled";

/// File id recorded for uploads rejected before an id was assigned.
const UNASSIGNED_FILE_ID: &str = "n/a";

/// Security orchestrator
///
/// Turns an upload into a `SecurityVerdict` (validation, then scanning),
/// answers access questions, issues time-limited links and records audit
/// events. Holds no per-request state; share it behind an `Arc`.
pub struct SecurityService {
    validator: FileValidator,
    scanner: Arc<dyn VirusScanner>,
    audit: AuditLogger,
    settings: SecuritySettings,
    access_policy: Arc<dyn AccessPolicy>,
    signer: UrlSigner,
}

impl SecurityService {
    pub fn new(
        validator: FileValidator,
        scanner: Arc<dyn VirusScanner>,
        audit: AuditLogger,
        settings: SecuritySettings,
        access_policy: Arc<dyn AccessPolicy>,
    ) -> Self {
        let signer = UrlSigner::new(
            settings.storage_endpoint_url.clone(),
            settings.signed_url_ttl,
            settings.url_signing_secret.as_deref(),
        );
        Self {
            validator,
            scanner,
            audit,
            settings,
            access_policy,
            signer,
        }
    }

    /// Wire a service from configuration with the default access policy.
    pub fn from_config(config: &GateConfig, scanner: Arc<dyn VirusScanner>, audit: AuditLogger) -> Self {
        Self::new(
            FileValidator::new(config.policy.clone()),
            scanner,
            audit,
            config.security.clone(),
            Arc::new(AuthenticatedUserPolicy),
        )
    }

    pub fn validator(&self) -> &FileValidator {
        &self.validator
    }

    pub fn settings(&self) -> &SecuritySettings {
        &self.settings
    }

    /// Combine prior validation errors with a virus scan into a verdict.
    ///
    /// Prior errors short-circuit: the content is not scanned. A scan that
    /// fails to complete does not fail the verdict; it only adds a warning.
    #[tracing::instrument(skip(self, file, validation_errors), fields(filename = %file.original_name))]
    pub async fn perform_security_check(
        &self,
        file: &FileMetadata,
        validation_errors: Vec<String>,
    ) -> SecurityVerdict {
        if !validation_errors.is_empty() {
            tracing::debug!(
                errors = validation_errors.len(),
                "Skipping virus scan, validation already failed"
            );
            return SecurityVerdict::new(validation_errors, None, Vec::new());
        }

        let mut warnings = Vec::new();
        let scan_result = if self.settings.virus_scan_enabled {
            let start = Instant::now();
            match self.scanner.scan(&file.content).await {
                Ok(detection) => {
                    let duration_ms = start.elapsed().as_millis() as u64;
                    Some(match detection {
                        Detection::Clean => ScanResult::clean(duration_ms),
                        Detection::Infected(viruses) => {
                            tracing::warn!(
                                viruses = %viruses.join(", "),
                                "Virus detected in upload"
                            );
                            ScanResult::infected(viruses, duration_ms)
                        }
                    })
                }
                Err(e) => {
                    tracing::error!(error = %e, "Virus scan failed, continuing without scan result");
                    warnings.push(SCAN_FAILED_WARNING.to_string());
                    None
                }
            }
        } else {
            warnings.push(SCAN_DISABLED_WARNING.to_string());
            None
        };

        let verdict = SecurityVerdict::new(validation_errors, scan_result, warnings);
        tracing::debug!(passed = verdict.passed(), "Security check completed");
        verdict
    }

    pub fn calculate_checksum(&self, content: &[u8], algorithm: HashAlgorithm) -> String {
        calculate_checksum(content, algorithm)
    }

    /// Anonymous callers are always refused; everyone else is up to the
    /// configured `AccessPolicy`.
    pub async fn check_access_permission(
        &self,
        file_id: &str,
        user_id: &str,
        action: AccessAction,
    ) -> bool {
        if user_id.trim().is_empty() {
            tracing::debug!(file_id, action = %action, "Access refused for anonymous caller");
            return false;
        }
        self.access_policy.is_allowed(file_id, user_id, action).await
    }

    /// Time-limited URL for a storage path; `ttl` defaults to the configured
    /// lifetime.
    pub fn generate_signed_url(
        &self,
        storage_path: &str,
        ttl: Option<Duration>,
    ) -> Result<String, GateError> {
        self.signer.generate(storage_path, ttl)
    }

    pub fn verify_signed_url(&self, url: &str) -> bool {
        self.signer.verify(url)
    }

    /// Record an audit event. Never blocks and never fails the caller.
    pub fn audit_log(
        &self,
        action: AuditAction,
        file_id: &str,
        user_id: &str,
        metadata: Map<String, Value>,
    ) {
        self.audit
            .emit(AuditEvent::new(action, file_id, user_id, metadata));
    }

    /// Full screening of one upload: validation, scan, and on success the
    /// identifiers needed to persist it. Emits exactly one audit event.
    #[tracing::instrument(skip(self, file), fields(filename = %file.original_name))]
    pub async fn screen_upload(&self, file: &FileMetadata, user_id: &str) -> UploadScreening {
        let validation = self.validator.validate(file);
        let verdict = if validation.is_valid() {
            self.perform_security_check(file, Vec::new()).await
        } else {
            let (errors, warnings) = validation.into_parts();
            SecurityVerdict::new(errors, None, warnings)
        };

        let category = self
            .validator
            .get_category(&file.declared_mime_type)
            .to_string();
        let sanitized_name = sanitize_filename(&file.original_name);
        let checksum = calculate_checksum(&file.content, self.settings.hash_algorithm);
        let scan_status = ScanStatus::from_scan_result(verdict.scan_result());

        if !verdict.passed() {
            let viruses = verdict
                .scan_result()
                .map(|r| r.viruses().to_vec())
                .unwrap_or_default();
            self.audit_log(
                AuditAction::UploadFailed,
                UNASSIGNED_FILE_ID,
                user_id,
                metadata(json!({
                    "filename": file.original_name,
                    "reason": verdict.validation_errors().join(", "),
                    "infected": verdict.is_infected(),
                    "viruses": viruses,
                })),
            );
            tracing::warn!(infected = verdict.is_infected(), "Upload rejected");

            return UploadScreening {
                file_id: None,
                verdict,
                category,
                checksum,
                sanitized_name,
                storage_key: None,
                scan_status,
            };
        }

        let file_id = Uuid::new_v4();
        let key = storage_key(file_id, &sanitized_name, Utc::now());

        self.audit_log(
            AuditAction::UploadSuccess,
            &file_id.to_string(),
            user_id,
            metadata(json!({
                "filename": file.original_name,
                "size": file.size_bytes,
                "checksum": checksum,
                "category": category,
                "scan_status": scan_status,
            })),
        );
        tracing::info!(file_id = %file_id, storage_key = %key, "Upload accepted");

        UploadScreening {
            file_id: Some(file_id),
            verdict,
            category,
            checksum,
            sanitized_name,
            storage_key: Some(key),
            scan_status,
        }
    }

    /// Access check that also records a `file_accessed` event, granted or not.
    pub async fn authorize(
        &self,
        file_id: &str,
        user_id: &str,
        action: AccessAction,
    ) -> Result<(), GateError> {
        let granted = self.check_access_permission(file_id, user_id, action).await;

        self.audit_log(
            AuditAction::FileAccessed,
            file_id,
            user_id,
            metadata(json!({
                "action": action,
                "granted": granted,
            })),
        );

        if granted {
            Ok(())
        } else {
            Err(GateError::AccessDenied {
                file_id: file_id.to_string(),
                action: action.to_string(),
            })
        }
    }

    pub fn record_deletion(&self, file_id: &str, user_id: &str, filename: &str) {
        self.audit_log(
            AuditAction::FileDeleted,
            file_id,
            user_id,
            metadata(json!({ "filename": filename })),
        );
    }

    pub async fn scanner_health(&self) -> ScannerHealth {
        let version = self.scanner.engine_version().await;
        let status = if !self.settings.virus_scan_enabled {
            ScannerStatus::Disabled
        } else if self.scanner.is_available().await {
            ScannerStatus::Up
        } else {
            ScannerStatus::Down
        };
        ScannerHealth { status, version }
    }
}

fn metadata(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::UnavailableScanner;

    fn service() -> SecurityService {
        let (audit, _rx) = AuditLogger::channel(16);
        SecurityService::new(
            FileValidator::default(),
            Arc::new(UnavailableScanner::new("test")),
            audit,
            SecuritySettings::default(),
            Arc::new(AuthenticatedUserPolicy),
        )
    }

    #[tokio::test]
    async fn anonymous_callers_are_refused() {
        let service = service();
        assert!(!service.check_access_permission("f1", "", AccessAction::Read).await);
        assert!(!service.check_access_permission("f1", "   ", AccessAction::Delete).await);
        assert!(service.check_access_permission("f1", "user-1", AccessAction::Read).await);
    }

    #[test]
    fn checksum_delegates_to_algorithm() {
        let service = service();
        assert_eq!(
            service.calculate_checksum(b"abc", HashAlgorithm::Sha256),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn metadata_helper_keeps_objects_only() {
        assert_eq!(metadata(json!({"a": 1})).len(), 1);
        assert!(metadata(json!([1, 2])).is_empty());
    }
}
