//! Time-limited access links.
//!
//! URL shape: `{endpoint}/files/{storage_path}?expires={unix_millis}`, plus
//! `&signature={hex(HMAC-SHA256(secret, "{url path}\n{expires}"))}` when a
//! signing secret is configured. Each storage path segment is percent-encoded.
//! Without a secret only the expiry is checked.

use chrono::{DateTime, Utc};
use filegate_core::GateError;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

const EXPIRES_PARAM: &str = "expires";
const SIGNATURE_PARAM: &str = "signature";

#[derive(Clone)]
pub struct UrlSigner {
    endpoint: String,
    default_ttl: Duration,
    secret: Option<Vec<u8>>,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner")
            .field("endpoint", &self.endpoint)
            .field("default_ttl", &self.default_ttl)
            .field("signed", &self.secret.is_some())
            .finish()
    }
}

impl UrlSigner {
    pub fn new(endpoint: impl Into<String>, default_ttl: Duration, secret: Option<&str>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            default_ttl,
            secret: secret.map(|s| s.as_bytes().to_vec()),
        }
    }

    pub fn is_signing(&self) -> bool {
        self.secret.is_some()
    }

    pub fn generate(&self, storage_path: &str, ttl: Option<Duration>) -> Result<String, GateError> {
        self.generate_at(storage_path, ttl, Utc::now())
    }

    pub fn generate_at(
        &self,
        storage_path: &str,
        ttl: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<String, GateError> {
        let path = storage_path.trim_start_matches('/');
        if path.is_empty() {
            return Err(GateError::InvalidInput("Storage path is empty".to_string()));
        }
        if path.split('/').any(|segment| segment == ".." || segment == ".") {
            return Err(GateError::InvalidInput(format!(
                "Storage path contains relative segments: {}",
                storage_path
            )));
        }

        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| GateError::InvalidInput(format!("Invalid storage endpoint: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| {
                GateError::InvalidInput(format!("Storage endpoint cannot hold a path: {}", self.endpoint))
            })?
            .pop_if_empty()
            .push("files")
            .extend(path.split('/'));

        let ttl = ttl.unwrap_or(self.default_ttl);
        let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires = now.timestamp_millis().saturating_add(ttl_millis);

        let signature = match &self.secret {
            Some(secret) => Some(sign(secret, url.path(), expires)?),
            None => None,
        };

        {
            let mut query = url.query_pairs_mut();
            query.append_pair(EXPIRES_PARAM, &expires.to_string());
            if let Some(signature) = &signature {
                query.append_pair(SIGNATURE_PARAM, signature);
            }
        }

        Ok(url.to_string())
    }

    pub fn verify(&self, url: &str) -> bool {
        self.verify_at(url, Utc::now())
    }

    pub fn verify_at(&self, url: &str, now: DateTime<Utc>) -> bool {
        let Ok(url) = Url::parse(url) else {
            return false;
        };

        let mut expires = None;
        let mut signature = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                EXPIRES_PARAM => expires = Some(value.into_owned()),
                SIGNATURE_PARAM => signature = Some(value.into_owned()),
                _ => {}
            }
        }

        let Some(expires) = expires.and_then(|e| e.parse::<i64>().ok()) else {
            return false;
        };
        if now.timestamp_millis() > expires {
            return false;
        }

        let Some(secret) = &self.secret else {
            return true;
        };
        let Some(tag) = signature.and_then(|s| hex::decode(s).ok()) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
            return false;
        };
        mac.update(signing_input(url.path(), expires).as_bytes());
        mac.verify_slice(&tag).is_ok()
    }
}

fn signing_input(path: &str, expires: i64) -> String {
    format!("{}\n{}", path, expires)
}

fn sign(secret: &[u8], path: &str, expires: i64) -> Result<String, GateError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| GateError::Internal(format!("HMAC key rejected: {}", e)))?;
    mac.update(signing_input(path, expires).as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}
