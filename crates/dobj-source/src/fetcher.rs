use std::io::Read;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FetchError, FetchResult};

/// Retrieves the bytes behind a source locator.
pub trait SourceFetcher: Send + Sync {
    fn fetch(&self, locator: &str) -> FetchResult<Vec<u8>>;
}

/// Fetcher settings as they appear in the service configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub max_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_bytes: 64 * 1024 * 1024,
            user_agent: concat!("dobj/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

/// Blocking HTTP(S) fetcher.
#[derive(Clone, Debug, Default)]
pub struct HttpFetcher {
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn parse(locator: &str) -> FetchResult<reqwest::Url> {
        let url = reqwest::Url::parse(locator).map_err(|e| FetchError::invalid(locator, e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(FetchError::invalid(locator, format!("unsupported scheme {other:?}"))),
        }
    }
}

impl SourceFetcher for HttpFetcher {
    fn fetch(&self, locator: &str) -> FetchResult<Vec<u8>> {
        let url = Self::parse(locator)?;
        let limit = self.config.max_bytes;

        // Built per call: a blocking client must not be created or dropped on
        // an async runtime thread, and callers may run us from one.
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .user_agent(self.config.user_agent.as_str())
            .build()
            .map_err(|e| FetchError::unreachable(locator, e.to_string()))?;

        tracing::debug!(locator, "fetching source");
        let response = client
            .get(url)
            .send()
            .map_err(|e| FetchError::unreachable(locator, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::unreachable(locator, format!("HTTP {}", status.as_u16())));
        }
        if response.content_length().is_some_and(|len| len > limit) {
            return Err(FetchError::TooLarge {
                locator: locator.to_string(),
                limit,
            });
        }

        let mut body = Vec::new();
        response
            .take(limit.saturating_add(1))
            .read_to_end(&mut body)
            .map_err(|e| FetchError::unreachable(locator, e.to_string()))?;
        if body.len() as u64 > limit {
            return Err(FetchError::TooLarge {
                locator: locator.to_string(),
                limit,
            });
        }

        tracing::debug!(locator, bytes = body.len(), "fetched source");
        Ok(body)
    }
}
