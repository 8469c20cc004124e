use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Result of one antivirus scan.
///
/// Built only through `clean` / `infected`, which keep `infected == !clean`
/// and `viruses` empty exactly when the content is clean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    clean: bool,
    infected: bool,
    viruses: Vec<String>,
    scan_duration_millis: u64,
}

impl ScanResult {
    pub fn clean(scan_duration_millis: u64) -> Self {
        Self {
            clean: true,
            infected: false,
            viruses: Vec::new(),
            scan_duration_millis,
        }
    }

    /// An infected result. An empty signature list is replaced by a generic
    /// name so that an infection always names at least one signature.
    pub fn infected(mut viruses: Vec<String>, scan_duration_millis: u64) -> Self {
        if viruses.is_empty() {
            viruses.push("Virus detected".to_string());
        }
        Self {
            clean: false,
            infected: true,
            viruses,
            scan_duration_millis,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.clean
    }

    pub fn is_infected(&self) -> bool {
        self.infected
    }

    pub fn viruses(&self) -> &[String] {
        &self.viruses
    }

    pub fn scan_duration_millis(&self) -> u64 {
        self.scan_duration_millis
    }
}

/// Scan state recorded next to a stored file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Clean,
    Infected,
    /// No scan result: scanning disabled or the scan failed.
    Pending,
}

impl ScanStatus {
    pub fn from_scan_result(scan_result: Option<&ScanResult>) -> Self {
        match scan_result {
            Some(result) if result.is_clean() => ScanStatus::Clean,
            Some(_) => ScanStatus::Infected,
            None => ScanStatus::Pending,
        }
    }
}

impl Display for ScanStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ScanStatus::Clean => write!(f, "clean"),
            ScanStatus::Infected => write!(f, "infected"),
            ScanStatus::Pending => write!(f, "pending"),
        }
    }
}
