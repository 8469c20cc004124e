#[cfg(feature = "clamav")]
use super::ClamAVScanner;
use super::{UnavailableScanner, VirusScanner};
use filegate_core::GateConfig;
use std::sync::Arc;

/// Create the virus scanner for this process.
///
/// Never fails: an unreachable daemon yields an `UnavailableScanner` so the
/// gate still starts, with scans degrading to "not confirmed infected".
pub async fn create_scanner(config: &GateConfig) -> Arc<dyn VirusScanner> {
    if !config.security.virus_scan_enabled {
        tracing::info!("Virus scanning disabled by configuration");
        return Arc::new(UnavailableScanner::new("virus scanning disabled"));
    }

    connect(config).await
}

#[cfg(feature = "clamav")]
async fn connect(config: &GateConfig) -> Arc<dyn VirusScanner> {
    match ClamAVScanner::connect(&config.scanner).await {
        Ok(scanner) => Arc::new(scanner),
        Err(e) => {
            tracing::warn!(
                error = %e,
                host = %config.scanner.host,
                port = config.scanner.port,
                "Failed to initialize ClamAV, continuing without virus scanning"
            );
            Arc::new(UnavailableScanner::new(e.to_string()))
        }
    }
}

#[cfg(not(feature = "clamav"))]
async fn connect(_config: &GateConfig) -> Arc<dyn VirusScanner> {
    tracing::warn!("ClamAV support not compiled in (clamav feature not enabled)");
    Arc::new(UnavailableScanner::new("clamav feature not enabled"))
}
