use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Link lifetime used when the caller does not pass one.
pub const DEFAULT_TTL_SECS: u64 = 1800;

/// Longest link lifetime accepted by default (seven days).
pub const MAX_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// A time-bounded URL granting read access to exactly one object.
///
/// The expiry is enforced by whoever serves the URL, not by the holder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedLink {
    pub url: String,
    pub container: String,
    pub key: String,
    pub ttl_secs: u64,
    pub expires_at: DateTime<Utc>,
}

impl PublishedLink {
    /// Build a link issued at `issued_at` and valid for `ttl_secs`.
    pub fn new(
        url: impl Into<String>,
        container: impl Into<String>,
        key: impl Into<String>,
        ttl_secs: u64,
        issued_at: DateTime<Utc>,
    ) -> Self {
        let expires_at = i64::try_from(ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|ttl| issued_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            url: url.into(),
            container: container.into(),
            key: key.into(),
            ttl_secs,
            expires_at,
        }
    }

    /// Returns `true` once `now` is at or past the expiry.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
