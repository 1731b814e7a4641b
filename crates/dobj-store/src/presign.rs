//! Expiring links for the built-in backends.
//!
//! A link has the form
//! `{base_url}/{container}/{key}?expires={unix seconds}&signature={hex}`.
//! The signature is a BLAKE3 keyed hash over the container, the key and the
//! expiry, so a link cannot be retargeted or extended without the signing key.

use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

/// Characters left unescaped in a path segment (RFC 3986 unreserved).
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const DOMAIN: &str = "dobj-link-v1";

/// Link settings as they appear in the service configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// URL prefix under which published links are served.
    pub base_url: String,
    /// Hex-encoded 32-byte signing key. A random key is used when unset,
    /// which invalidates every link on restart.
    pub signing_key: Option<String>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/v1/shared".into(),
            signing_key: None,
        }
    }
}

/// Errors from link signing and verification.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LinkError {
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    #[error("link signature does not match")]
    BadSignature,

    #[error("link expired at {0}")]
    Expired(i64),
}

/// Mints and verifies expiring links.
#[derive(Clone)]
pub struct LinkSigner {
    key: [u8; 32],
    base_url: String,
}

impl LinkSigner {
    pub fn new(key: [u8; 32], base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { key, base_url }
    }

    /// Signer with a fresh random key.
    pub fn random(base_url: impl Into<String>) -> Self {
        Self::new(rand::random(), base_url)
    }

    pub fn from_config(config: &LinkConfig) -> Result<Self, LinkError> {
        match &config.signing_key {
            Some(hex_key) => {
                let bytes = hex::decode(hex_key).map_err(|e| LinkError::InvalidKey(e.to_string()))?;
                let key: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
                    LinkError::InvalidKey(format!("expected 32 bytes, got {}", bytes.len()))
                })?;
                Ok(Self::new(key, config.base_url.clone()))
            }
            None => Ok(Self::random(config.base_url.clone())),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sign a link valid for `ttl_secs` from now.
    pub fn sign(&self, container: &str, key: &str, ttl_secs: u64) -> String {
        self.sign_at(container, key, ttl_secs, Utc::now())
    }

    pub fn sign_at(&self, container: &str, key: &str, ttl_secs: u64, now: DateTime<Utc>) -> String {
        let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        let expires = now.timestamp().saturating_add(ttl);
        let signature = self.signature(container, key, expires);

        let path = key
            .split('/')
            .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/");
        format!(
            "{}/{}/{}?expires={}&signature={}",
            self.base_url,
            utf8_percent_encode(container, SEGMENT),
            path,
            expires,
            signature.to_hex(),
        )
    }

    /// Check a link presented now.
    pub fn verify(&self, container: &str, key: &str, expires: i64, signature: &str) -> Result<(), LinkError> {
        self.verify_at(container, key, expires, signature, Utc::now())
    }

    pub fn verify_at(
        &self,
        container: &str,
        key: &str,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<(), LinkError> {
        let presented = blake3::Hash::from_hex(signature).map_err(|_| LinkError::BadSignature)?;
        // blake3::Hash equality is constant-time.
        if presented != self.signature(container, key, expires) {
            return Err(LinkError::BadSignature);
        }
        if now.timestamp() >= expires {
            return Err(LinkError::Expired(expires));
        }
        Ok(())
    }

    fn signature(&self, container: &str, key: &str, expires: i64) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new_keyed(&self.key);
        hasher.update(DOMAIN.as_bytes());
        hasher.update(b"\n");
        hasher.update(container.as_bytes());
        hasher.update(b"\n");
        hasher.update(key.as_bytes());
        hasher.update(b"\n");
        hasher.update(expires.to_string().as_bytes());
        hasher.finalize()
    }
}

impl std::fmt::Debug for LinkSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkSigner")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
