use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{FetchError, FetchResult};
use crate::fetcher::SourceFetcher;

/// Fetcher backed by a fixed locator → bytes table.
///
/// Locators that are not in the table are reported as unreachable, except
/// those without a `scheme://` part, which are reported as invalid.
#[derive(Debug, Default)]
pub struct InMemoryFetcher {
    sources: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the content served for `locator`.
    pub fn insert(&self, locator: impl Into<String>, content: impl Into<Vec<u8>>) {
        if let Ok(mut sources) = self.sources.write() {
            sources.insert(locator.into(), content.into());
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_source(self, locator: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.insert(locator, content);
        self
    }
}

impl SourceFetcher for InMemoryFetcher {
    fn fetch(&self, locator: &str) -> FetchResult<Vec<u8>> {
        if !locator.contains("://") {
            return Err(FetchError::invalid(locator, "missing scheme"));
        }
        let sources = self
            .sources
            .read()
            .map_err(|e| FetchError::unreachable(locator, format!("lock poisoned: {e}")))?;
        sources
            .get(locator)
            .cloned()
            .ok_or_else(|| FetchError::unreachable(locator, "no such source"))
    }
}
