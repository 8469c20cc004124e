use async_trait::async_trait;
use bytes::Bytes;
use filegate_core::{
    AccessAction, AuditAction, AuditEvent, FileMetadata, GateError, HashAlgorithm, ScanStatus,
    SecuritySettings,
};
use filegate_processing::{FileValidator, SPOOFING_WARNING};
use filegate_services::{
    AccessPolicy, AuditLogger, AuthenticatedUserPolicy, Detection, ScanError, ScannerStatus,
    SecurityService, VirusScanner,
};
use filegate_services::security::{SCAN_DISABLED_WARNING, SCAN_FAILED_WARNING};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Clone, Copy)]
enum Outcome {
    Clean,
    Infected(&'static str),
    Fail,
}

struct MockScanner {
    outcome: Outcome,
    calls: AtomicUsize,
}

impl MockScanner {
    fn new(outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn respond(&self) -> Result<Detection, ScanError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.outcome {
            Outcome::Clean => Ok(Detection::Clean),
            Outcome::Infected(name) => Ok(Detection::Infected(vec![name.to_string()])),
            Outcome::Fail => Err(ScanError::Engine("INSTREAM size limit exceeded. ERROR".into())),
        }
    }
}

#[async_trait]
impl VirusScanner for MockScanner {
    async fn scan(&self, _content: &[u8]) -> Result<Detection, ScanError> {
        self.respond()
    }

    async fn scan_file(&self, _path: &Path) -> Result<Detection, ScanError> {
        self.respond()
    }

    async fn engine_version(&self) -> String {
        "ClamAV 1.3.1/27300".to_string()
    }

    async fn is_available(&self) -> bool {
        !matches!(self.outcome, Outcome::Fail)
    }
}

/// Grants access only to the file's owner, recorded as `<owner>:<file>`.
struct OwnerOnlyPolicy;

#[async_trait]
impl AccessPolicy for OwnerOnlyPolicy {
    async fn is_allowed(&self, file_id: &str, user_id: &str, _action: AccessAction) -> bool {
        file_id.starts_with(&format!("{}:", user_id))
    }
}

struct Harness {
    service: SecurityService,
    scanner: Arc<MockScanner>,
    audit: mpsc::Receiver<AuditEvent>,
}

fn harness_with(outcome: Outcome, settings: SecuritySettings) -> Harness {
    let scanner = MockScanner::new(outcome);
    let (audit, rx) = AuditLogger::channel(64);
    let service = SecurityService::new(
        FileValidator::default(),
        scanner.clone(),
        audit,
        settings,
        Arc::new(AuthenticatedUserPolicy),
    );
    Harness {
        service,
        scanner,
        audit: rx,
    }
}

fn harness(outcome: Outcome) -> Harness {
    harness_with(outcome, SecuritySettings::default())
}

fn pdf(name: &str) -> FileMetadata {
    let mut content = b"%PDF-1.4\n".to_vec();
    content.resize(512, b'0');
    FileMetadata::new(name, "application/pdf", Bytes::from(content))
}

impl Harness {
    fn single_audit_event(&mut self) -> AuditEvent {
        let event = self.audit.try_recv().expect("one audit event");
        assert!(self.audit.try_recv().is_err(), "more than one audit event");
        event
    }
}

#[tokio::test]
async fn clean_upload_passes_with_scan_result() {
    let h = harness(Outcome::Clean);
    let verdict = h.service.perform_security_check(&pdf("test.pdf"), Vec::new()).await;

    assert!(verdict.passed());
    assert!(verdict.warnings().is_empty());
    let scan = verdict.scan_result().expect("scan result");
    assert!(scan.is_clean());
    assert!(scan.viruses().is_empty());
    assert_eq!(h.scanner.calls(), 1);
}

#[tokio::test]
async fn infected_upload_fails_and_names_signature() {
    let h = harness(Outcome::Infected("Eicar-Test-Signature"));
    let verdict = h.service.perform_security_check(&pdf("test.pdf"), Vec::new()).await;

    assert!(!verdict.passed());
    assert!(verdict.is_infected());
    assert!(verdict.validation_errors().is_empty());
    assert_eq!(
        verdict.scan_result().unwrap().viruses(),
        ["Eicar-Test-Signature"]
    );
}

#[tokio::test]
async fn prior_errors_skip_the_scan() {
    let h = harness(Outcome::Clean);
    let errors = vec!["Filename is a reserved system name".to_string()];
    let verdict = h.service.perform_security_check(&pdf("CON.pdf"), errors.clone()).await;

    assert!(!verdict.passed());
    assert_eq!(verdict.validation_errors(), errors.as_slice());
    assert!(verdict.scan_result().is_none());
    assert_eq!(h.scanner.calls(), 0);
}

#[tokio::test]
async fn scan_failure_degrades_to_warning() {
    let h = harness(Outcome::Fail);
    let verdict = h.service.perform_security_check(&pdf("test.pdf"), Vec::new()).await;

    assert!(verdict.passed());
    assert!(verdict.scan_result().is_none());
    assert_eq!(verdict.warnings(), [SCAN_FAILED_WARNING]);
    assert_eq!(h.scanner.calls(), 1);
}

#[tokio::test]
async fn disabled_scanning_never_calls_the_engine() {
    let settings = SecuritySettings {
        virus_scan_enabled: false,
        ..SecuritySettings::default()
    };
    let h = harness_with(Outcome::Infected("ignored"), settings);
    let verdict = h.service.perform_security_check(&pdf("test.pdf"), Vec::new()).await;

    assert!(verdict.passed());
    assert_eq!(verdict.warnings(), [SCAN_DISABLED_WARNING]);
    assert_eq!(h.scanner.calls(), 0);
}

#[tokio::test]
async fn screen_upload_accepts_and_records_success() {
    let mut h = harness(Outcome::Clean);
    let file = pdf("quarterly report.pdf");
    let screening = h.service.screen_upload(&file, "user-1").await;

    assert!(screening.passed());
    let file_id = screening.file_id.expect("file id assigned");
    assert_eq!(screening.category, "document");
    assert_eq!(screening.sanitized_name, "quarterly_report.pdf");
    assert_eq!(screening.scan_status, ScanStatus::Clean);
    assert_eq!(
        screening.checksum,
        h.service.calculate_checksum(&file.content, HashAlgorithm::Sha256)
    );

    let key = screening.storage_key.expect("storage key");
    assert!(key.starts_with("files/"));
    assert!(key.ends_with(&format!("/{}-quarterly_report.pdf", file_id)));
    assert_eq!(key.split('/').count(), 5);

    let event = h.single_audit_event();
    assert_eq!(event.action, AuditAction::UploadSuccess);
    assert_eq!(event.file_id, file_id.to_string());
    assert_eq!(event.user_id, "user-1");
    assert_eq!(event.metadata["checksum"], screening.checksum.as_str());
    assert_eq!(event.metadata["scan_status"], "clean");
    assert_eq!(event.metadata["size"], 512);
}

#[tokio::test]
async fn screen_upload_rejects_spoofed_file_without_scanning() {
    let mut h = harness(Outcome::Clean);
    let file = FileMetadata::new("fake.pdf", "application/pdf", b"MZ\x90\x00binary".to_vec());
    let screening = h.service.screen_upload(&file, "user-1").await;

    assert!(!screening.passed());
    assert!(screening.file_id.is_none());
    assert!(screening.storage_key.is_none());
    assert_eq!(screening.scan_status, ScanStatus::Pending);
    assert!(screening.verdict.warnings().iter().any(|w| w == SPOOFING_WARNING));
    assert_eq!(h.scanner.calls(), 0);

    let event = h.single_audit_event();
    assert_eq!(event.action, AuditAction::UploadFailed);
    assert_eq!(event.file_id, "n/a");
    assert!(event.metadata["reason"]
        .as_str()
        .unwrap()
        .contains("does not match"));
    assert_eq!(event.metadata["infected"], false);
}

#[tokio::test]
async fn screen_upload_records_infection() {
    let mut h = harness(Outcome::Infected("Win.Test.EICAR_HDB-1"));
    let screening = h.service.screen_upload(&pdf("test.pdf"), "user-2").await;

    assert!(!screening.passed());
    assert_eq!(screening.scan_status, ScanStatus::Infected);

    let event = h.single_audit_event();
    assert_eq!(event.action, AuditAction::UploadFailed);
    assert_eq!(event.metadata["infected"], true);
    assert_eq!(event.metadata["viruses"][0], "Win.Test.EICAR_HDB-1");
}

#[tokio::test]
async fn screen_upload_reports_unknown_category() {
    let h = harness(Outcome::Clean);
    let file = FileMetadata::new("movie.mp4", "video/mp4", b"\x00\x00\x00\x18ftyp".to_vec());
    let screening = h.service.screen_upload(&file, "user-1").await;

    assert!(!screening.passed());
    assert_eq!(screening.category, "unknown");
}

#[tokio::test]
async fn default_policy_access_decisions() {
    let h = harness(Outcome::Clean);
    assert!(!h.service.check_access_permission("file-1", "", AccessAction::Read).await);
    assert!(h.service.check_access_permission("file-1", "user-1", AccessAction::Read).await);
}

#[tokio::test]
async fn authorize_records_grants_and_denials() {
    let mut h = harness(Outcome::Clean);

    h.service
        .authorize("file-1", "user-1", AccessAction::Read)
        .await
        .unwrap();
    let event = h.single_audit_event();
    assert_eq!(event.action, AuditAction::FileAccessed);
    assert_eq!(event.metadata["action"], "read");
    assert_eq!(event.metadata["granted"], true);

    let err = h
        .service
        .authorize("file-1", " ", AccessAction::Delete)
        .await
        .unwrap_err();
    assert!(matches!(err, GateError::AccessDenied { .. }));
    let event = h.single_audit_event();
    assert_eq!(event.metadata["granted"], false);
    assert!(event.is_failure());
}

#[tokio::test]
async fn custom_access_policy_is_consulted() {
    let (audit, _rx) = AuditLogger::channel(8);
    let service = SecurityService::new(
        FileValidator::default(),
        MockScanner::new(Outcome::Clean),
        audit,
        SecuritySettings::default(),
        Arc::new(OwnerOnlyPolicy),
    );

    assert!(service.check_access_permission("alice:f1", "alice", AccessAction::Write).await);
    assert!(!service.check_access_permission("alice:f1", "bob", AccessAction::Read).await);
    assert!(!service.check_access_permission("alice:f1", "", AccessAction::Read).await);
}

#[tokio::test]
async fn deletion_is_audited() {
    let mut h = harness(Outcome::Clean);
    h.service.record_deletion("file-9", "user-1", "old.csv");

    let event = h.single_audit_event();
    assert_eq!(event.action, AuditAction::FileDeleted);
    assert_eq!(event.metadata["filename"], "old.csv");
}

#[tokio::test]
async fn scanner_health_states() {
    let up = harness(Outcome::Clean).service.scanner_health().await;
    assert_eq!(up.status, ScannerStatus::Up);
    assert_eq!(up.version, "ClamAV 1.3.1/27300");

    let down = harness(Outcome::Fail).service.scanner_health().await;
    assert_eq!(down.status, ScannerStatus::Down);

    let settings = SecuritySettings {
        virus_scan_enabled: false,
        ..SecuritySettings::default()
    };
    let disabled = harness_with(Outcome::Clean, settings).service.scanner_health().await;
    assert_eq!(disabled.status, ScannerStatus::Disabled);
}

#[tokio::test]
async fn signed_urls_round_trip_through_the_service() {
    let settings = SecuritySettings {
        storage_endpoint_url: "https://files.example.com".to_string(),
        url_signing_secret: Some("k".repeat(32)),
        ..SecuritySettings::default()
    };
    let h = harness_with(Outcome::Clean, settings);

    let url = h
        .service
        .generate_signed_url("files/2024/01/01/x-report.pdf", Some(Duration::from_secs(60)))
        .unwrap();
    assert!(url.starts_with("https://files.example.com/files/files/2024/01/01/x-report.pdf?expires="));
    assert!(h.service.verify_signed_url(&url));
    assert!(!h.service.verify_signed_url(&url.replace("x-report", "y-report")));
}

#[tokio::test]
async fn concurrent_checks_are_independent() {
    let h = harness(Outcome::Clean);
    let service = Arc::new(h.service);

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .perform_security_check(&pdf(&format!("doc-{}.pdf", i)), Vec::new())
                    .await
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().passed());
    }
    assert_eq!(h.scanner.calls(), 16);
}
