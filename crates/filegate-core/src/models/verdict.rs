use serde::Serialize;

use super::ScanResult;

/// Terminal output of the security check for one upload.
///
/// `passed` is computed from the validation errors and the scan result when
/// the verdict is built; it is not settable on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityVerdict {
    passed: bool,
    validation_errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scan_result: Option<ScanResult>,
    warnings: Vec<String>,
}

impl SecurityVerdict {
    pub fn new(
        validation_errors: Vec<String>,
        scan_result: Option<ScanResult>,
        warnings: Vec<String>,
    ) -> Self {
        let infected = scan_result.as_ref().is_some_and(ScanResult::is_infected);
        Self {
            passed: validation_errors.is_empty() && !infected,
            validation_errors,
            scan_result,
            warnings,
        }
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn validation_errors(&self) -> &[String] {
        &self.validation_errors
    }

    pub fn scan_result(&self) -> Option<&ScanResult> {
        self.scan_result.as_ref()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn is_infected(&self) -> bool {
        self.scan_result.as_ref().is_some_and(ScanResult::is_infected)
    }
}
