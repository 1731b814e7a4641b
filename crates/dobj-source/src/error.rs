use thiserror::Error;

/// Errors from fetching a source locator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The locator is not a URL this fetcher can use.
    #[error("invalid source locator {locator:?}: {reason}")]
    InvalidLocator { locator: String, reason: String },

    /// The source could not be read (connection, timeout, HTTP status).
    #[error("source unreachable {locator:?}: {reason}")]
    Unreachable { locator: String, reason: String },

    /// The source is larger than the configured limit.
    #[error("source {locator:?} exceeds {limit} bytes")]
    TooLarge { locator: String, limit: u64 },
}

impl FetchError {
    pub fn invalid(locator: &str, reason: impl Into<String>) -> Self {
        Self::InvalidLocator {
            locator: locator.to_string(),
            reason: reason.into(),
        }
    }

    pub fn unreachable(locator: &str, reason: impl Into<String>) -> Self {
        Self::Unreachable {
            locator: locator.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;
