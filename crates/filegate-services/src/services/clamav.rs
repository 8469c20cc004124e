use async_trait::async_trait;
use clamav_client::{clean, Tcp};
use filegate_core::ScannerConfig;
use std::path::{Path, PathBuf};
use std::str;
use std::time::{Duration, Instant};

use super::scanner::{Detection, ScanError, VirusScanner, VERSION_UNKNOWN};

/// clamd client
///
/// Every call opens its own TCP connection, so concurrent scans never
/// serialise on shared state. The blocking client runs on the blocking pool,
/// bounded by the configured timeout.
#[derive(Clone, Debug)]
pub struct ClamAVScanner {
    address: String,
    timeout_secs: u64,
}

impl ClamAVScanner {
    pub fn new(config: &ScannerConfig) -> Self {
        Self {
            address: format!("{}:{}", config.host, config.port),
            timeout_secs: config.timeout_secs,
        }
    }

    /// Create the scanner and check the daemon answers `PING`.
    pub async fn connect(config: &ScannerConfig) -> Result<Self, ScanError> {
        let scanner = Self::new(config);
        scanner.ping().await?;
        tracing::info!(address = %scanner.address, "Connected to ClamAV daemon");
        Ok(scanner)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub async fn ping(&self) -> Result<(), ScanError> {
        let response = self
            .run(|address| {
                clamav_client::ping(Tcp {
                    host_address: address,
                })
            })
            .await?;

        if response == clamav_client::PONG {
            Ok(())
        } else {
            Err(ScanError::InvalidResponse(response_text(&response)))
        }
    }

    /// Run one blocking client call against the daemon, bounded by the timeout.
    async fn run<F>(&self, call: F) -> Result<Vec<u8>, ScanError>
    where
        F: FnOnce(&str) -> std::io::Result<Vec<u8>> + Send + 'static,
    {
        let address = self.address.clone();
        let timeout_secs = self.timeout_secs;

        let joined = tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            tokio::task::spawn_blocking(move || call(address.as_str())),
        )
        .await;

        match joined {
            Ok(Ok(result)) => Ok(result?),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "ClamAV scan task failed");
                Err(ScanError::TaskFailed(e.to_string()))
            }
            Err(_) => {
                tracing::error!(timeout_secs, "ClamAV call timed out");
                Err(ScanError::Timeout(timeout_secs))
            }
        }
    }

    async fn scan_with<F>(&self, call: F) -> Result<Detection, ScanError>
    where
        F: FnOnce(&str) -> std::io::Result<Vec<u8>> + Send + 'static,
    {
        let start = Instant::now();
        tracing::debug!(address = %self.address, "Starting ClamAV scan");

        let response = self.run(call).await.inspect_err(|e| {
            tracing::error!(error = %e, "ClamAV scan failed");
        })?;
        let detection = parse_scan_response(&response)?;

        match &detection {
            Detection::Clean => tracing::info!(
                duration_ms = start.elapsed().as_millis(),
                "File scan completed: clean"
            ),
            Detection::Infected(viruses) => tracing::warn!(
                duration_ms = start.elapsed().as_millis(),
                viruses = %viruses.join(", "),
                "File scan detected virus"
            ),
        }

        Ok(detection)
    }
}

#[async_trait]
impl VirusScanner for ClamAVScanner {
    async fn scan(&self, content: &[u8]) -> Result<Detection, ScanError> {
        let data = content.to_vec();
        self.scan_with(move |address| {
            clamav_client::scan_buffer(
                data.as_slice(),
                Tcp {
                    host_address: address,
                },
                None,
            )
        })
        .await
    }

    async fn scan_file(&self, path: &Path) -> Result<Detection, ScanError> {
        let path: PathBuf = path.to_path_buf();
        self.scan_with(move |address| {
            clamav_client::scan_file(
                path,
                Tcp {
                    host_address: address,
                },
                None,
            )
        })
        .await
    }

    async fn engine_version(&self) -> String {
        let response = self
            .run(|address| {
                clamav_client::get_version(Tcp {
                    host_address: address,
                })
            })
            .await;

        match response {
            Ok(bytes) => {
                let version = response_text(&bytes);
                if version.is_empty() {
                    VERSION_UNKNOWN.to_string()
                } else {
                    version
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to query ClamAV version");
                VERSION_UNKNOWN.to_string()
            }
        }
    }

    async fn is_available(&self) -> bool {
        self.ping().await.is_ok()
    }
}

fn response_text(response: &[u8]) -> String {
    String::from_utf8_lossy(response)
        .trim_end_matches('\0')
        .trim()
        .to_string()
}

/// Interpret a clamd scan reply such as `stream: OK` or
/// `stream: Eicar-Test-Signature FOUND`.
fn parse_scan_response(response: &[u8]) -> Result<Detection, ScanError> {
    let text = str::from_utf8(response)
        .map_err(|e| ScanError::InvalidResponse(format!("non UTF-8 reply: {}", e)))?;
    let text = text.trim_end_matches('\0').trim();

    if text.contains("ERROR") {
        return Err(ScanError::Engine(text.to_string()));
    }

    let is_clean = clean(response).map_err(|e| ScanError::InvalidResponse(e.to_string()))?;
    if is_clean {
        return Ok(Detection::Clean);
    }

    let viruses: Vec<String> = text
        .lines()
        .filter_map(|line| line.trim().strip_suffix("FOUND"))
        .map(|line| {
            line.split_once(": ")
                .map(|(_, name)| name)
                .unwrap_or(line)
                .trim()
                .to_string()
        })
        .filter(|name| !name.is_empty())
        .collect();

    if viruses.is_empty() {
        return Err(ScanError::InvalidResponse(text.to_string()));
    }

    Ok(Detection::Infected(viruses))
}
