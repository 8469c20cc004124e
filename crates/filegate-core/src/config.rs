//! Configuration module
//!
//! Configuration is read once at startup from the environment (with `.env`
//! support) and is immutable afterwards. Malformed values are a startup error:
//! this is the only place where the gate refuses to run.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::time::Duration;

use crate::models::Category;
use crate::policy::FilePolicy;

const CLAMAV_PORT: u16 = 3310;
const CLAMAV_TIMEOUT_SECS: u64 = 60;
const SIGNED_URL_TTL_SECS: u64 = 3600;
const AUDIT_QUEUE_SIZE: usize = 1024;
const MIN_SIGNING_SECRET_LEN: usize = 32;

/// Hash function used for content checksums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl FromStr for HashAlgorithm {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            "sha384" | "sha-384" => Ok(HashAlgorithm::Sha384),
            "sha512" | "sha-512" => Ok(HashAlgorithm::Sha512),
            _ => Err(anyhow::anyhow!("Unsupported hash algorithm: {}", s)),
        }
    }
}

impl Display for HashAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            HashAlgorithm::Sha256 => write!(f, "sha256"),
            HashAlgorithm::Sha384 => write!(f, "sha384"),
            HashAlgorithm::Sha512 => write!(f, "sha512"),
        }
    }
}

/// Connection settings for the clamd daemon.
#[derive(Clone, Debug)]
pub struct ScannerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for one scan, in seconds
    pub timeout_secs: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: CLAMAV_PORT,
            timeout_secs: CLAMAV_TIMEOUT_SECS,
        }
    }
}

/// Settings consumed by the security orchestrator.
#[derive(Clone, Debug)]
pub struct SecuritySettings {
    pub virus_scan_enabled: bool,
    pub hash_algorithm: HashAlgorithm,
    pub signed_url_ttl: Duration,
    pub storage_endpoint_url: String,
    /// When set, signed URLs carry an HMAC that `verify_signed_url` checks.
    pub url_signing_secret: Option<String>,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            virus_scan_enabled: true,
            hash_algorithm: HashAlgorithm::Sha256,
            signed_url_ttl: Duration::from_secs(SIGNED_URL_TTL_SECS),
            storage_endpoint_url: "http://localhost:9000".to_string(),
            url_signing_secret: None,
        }
    }
}

/// Gate configuration
#[derive(Clone, Debug)]
pub struct GateConfig {
    pub environment: String,
    pub policy: FilePolicy,
    pub scanner: ScannerConfig,
    pub security: SecuritySettings,
    pub audit_queue_size: usize,
}

impl GateConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let policy = policy_from_lookup(&lookup)?;

        let scanner = ScannerConfig {
            host: lookup("CLAMAV_HOST").unwrap_or_else(|| "localhost".to_string()),
            port: parse_var(&lookup, "CLAMAV_PORT", CLAMAV_PORT)?,
            timeout_secs: parse_var(&lookup, "CLAMAV_TIMEOUT_SECS", CLAMAV_TIMEOUT_SECS)?,
        };

        let security = SecuritySettings {
            virus_scan_enabled: parse_bool(&lookup, "ENABLE_VIRUS_SCAN", true)?,
            hash_algorithm: parse_var(&lookup, "CHECKSUM_ALGORITHM", HashAlgorithm::Sha256)?,
            signed_url_ttl: Duration::from_secs(parse_var(
                &lookup,
                "SIGNED_URL_TTL_SECS",
                SIGNED_URL_TTL_SECS,
            )?),
            storage_endpoint_url: lookup("STORAGE_ENDPOINT_URL")
                .unwrap_or_else(|| "http://localhost:9000".to_string())
                .trim_end_matches('/')
                .to_string(),
            url_signing_secret: lookup("URL_SIGNING_SECRET").filter(|s| !s.is_empty()),
        };

        let config = GateConfig {
            environment,
            policy,
            scanner,
            security,
            audit_queue_size: parse_var(&lookup, "AUDIT_QUEUE_SIZE", AUDIT_QUEUE_SIZE)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check if the gate is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.scanner.timeout_secs == 0 {
            return Err(anyhow::anyhow!("CLAMAV_TIMEOUT_SECS must be greater than 0"));
        }

        if self.security.signed_url_ttl.is_zero() {
            return Err(anyhow::anyhow!("SIGNED_URL_TTL_SECS must be greater than 0"));
        }

        if self.audit_queue_size == 0 {
            return Err(anyhow::anyhow!("AUDIT_QUEUE_SIZE must be greater than 0"));
        }

        let endpoint = &self.security.storage_endpoint_url;
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "STORAGE_ENDPOINT_URL must be an http(s) URL, got '{}'",
                endpoint
            ));
        }

        match self.security.url_signing_secret.as_deref() {
            Some(secret) if secret.len() < MIN_SIGNING_SECRET_LEN => {
                return Err(anyhow::anyhow!(
                    "URL_SIGNING_SECRET must be at least {} characters long",
                    MIN_SIGNING_SECRET_LEN
                ));
            }
            None if self.is_production() => {
                return Err(anyhow::anyhow!(
                    "URL_SIGNING_SECRET must be set in production"
                ));
            }
            _ => {}
        }

        Ok(())
    }
}

fn policy_from_lookup<F>(lookup: &F) -> Result<FilePolicy, anyhow::Error>
where
    F: Fn(&str) -> Option<String>,
{
    let mut policy = FilePolicy::default();

    for category in Category::ALL {
        let prefix = category.as_str().to_uppercase();

        if let Some(types) = lookup(&format!("{}_ALLOWED_CONTENT_TYPES", prefix)) {
            let types: Vec<String> = types
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
            policy = policy.with_allowed_types(category, types);
        }

        let key = format!("MAX_{}_SIZE_MB", prefix);
        if lookup(&key).is_some() {
            let mb: u64 = parse_var(lookup, &key, 0)?;
            policy = policy.with_size_limit(category, megabytes_to_bytes(&key, mb)?);
        }
    }

    if lookup("MAX_DEFAULT_SIZE_MB").is_some() {
        let mb: u64 = parse_var(lookup, "MAX_DEFAULT_SIZE_MB", 0)?;
        policy = policy.with_default_size_limit(megabytes_to_bytes("MAX_DEFAULT_SIZE_MB", mb)?);
    }

    Ok(policy)
}

fn megabytes_to_bytes(key: &str, mb: u64) -> Result<u64, anyhow::Error> {
    mb.checked_mul(1024 * 1024)
        .ok_or_else(|| anyhow::anyhow!("{} is too large: {} MB", key, mb))
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, anyhow::Error>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", key, raw, e)),
        None => Ok(default),
    }
}

fn parse_bool<F>(lookup: &F, key: &str, default: bool) -> Result<bool, anyhow::Error>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .to_lowercase()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be 'true' or 'false', got '{}'", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<GateConfig, anyhow::Error> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GateConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.environment, "development");
        assert!(config.security.virus_scan_enabled);
        assert_eq!(config.security.hash_algorithm, HashAlgorithm::Sha256);
        assert_eq!(config.security.signed_url_ttl, Duration::from_secs(3600));
        assert_eq!(config.scanner.port, 3310);
        assert_eq!(config.scanner.timeout_secs, 60);
        assert!(config.security.url_signing_secret.is_none());
        assert_eq!(config.policy.max_size_for(Some(Category::Image)), 20 * 1024 * 1024);
    }

    #[test]
    fn overrides_are_applied() {
        let config = config_from(&[
            ("ENABLE_VIRUS_SCAN", "FALSE"),
            ("CLAMAV_HOST", "clamd"),
            ("CLAMAV_PORT", "3311"),
            ("CHECKSUM_ALGORITHM", "sha-512"),
            ("MAX_IMAGE_SIZE_MB", "5"),
            ("IMAGE_ALLOWED_CONTENT_TYPES", "image/png, image/avif"),
            ("STORAGE_ENDPOINT_URL", "https://files.example.com/"),
        ])
        .unwrap();

        assert!(!config.security.virus_scan_enabled);
        assert_eq!(config.scanner.host, "clamd");
        assert_eq!(config.scanner.port, 3311);
        assert_eq!(config.security.hash_algorithm, HashAlgorithm::Sha512);
        assert_eq!(config.policy.max_size_for(Some(Category::Image)), 5 * 1024 * 1024);
        assert_eq!(config.policy.category_of("image/avif"), Some(Category::Image));
        assert_eq!(config.policy.category_of("image/jpeg"), None);
        assert_eq!(config.security.storage_endpoint_url, "https://files.example.com");
    }

    #[test]
    fn malformed_values_abort() {
        assert!(config_from(&[("CLAMAV_PORT", "not-a-port")]).is_err());
        assert!(config_from(&[("ENABLE_VIRUS_SCAN", "maybe")]).is_err());
        assert!(config_from(&[("CHECKSUM_ALGORITHM", "md5")]).is_err());
        assert!(config_from(&[("MAX_DATA_SIZE_MB", "ten")]).is_err());
        assert!(config_from(&[("MAX_DATA_SIZE_MB", "18446744073709551615")]).is_err());
        assert!(config_from(&[("MAX_DEFAULT_SIZE_MB", "17592186044416")]).is_err());
        assert!(config_from(&[("CLAMAV_TIMEOUT_SECS", "0")]).is_err());
        assert!(config_from(&[("STORAGE_ENDPOINT_URL", "ftp://x")]).is_err());
    }

    #[test]
    fn production_requires_signing_secret() {
        let err = config_from(&[("ENVIRONMENT", "production")]).unwrap_err();
        assert!(err.to_string().contains("URL_SIGNING_SECRET"));

        let secret = "s".repeat(32);
        let config = config_from(&[("ENVIRONMENT", "prod"), ("URL_SIGNING_SECRET", &secret)]).unwrap();
        assert!(config.is_production());
    }

    #[test]
    fn short_signing_secret_is_rejected() {
        assert!(config_from(&[("URL_SIGNING_SECRET", "short")]).is_err());
    }

    #[test]
    fn hash_algorithm_parsing() {
        assert_eq!("SHA256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("sha-384".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha384);
        assert!("md5".parse::<HashAlgorithm>().is_err());
        assert_eq!(HashAlgorithm::Sha512.to_string(), "sha512");
    }
}
