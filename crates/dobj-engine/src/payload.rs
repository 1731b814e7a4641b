use dobj_source::SourceFetcher;

use crate::error::EngineResult;

/// Content argument of `create` and `update`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    /// Bytes supplied directly by the caller.
    Content(Vec<u8>),
    /// A locator the bytes are fetched from.
    Source(String),
}

impl Payload {
    pub fn content(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Content(bytes.into())
    }

    pub fn source(locator: impl Into<String>) -> Self {
        Self::Source(locator.into())
    }

    /// Produce the bytes to store, fetching them if needed.
    pub(crate) fn into_bytes(self, fetcher: &dyn SourceFetcher) -> EngineResult<Vec<u8>> {
        match self {
            Self::Content(bytes) => Ok(bytes),
            Self::Source(locator) => Ok(fetcher.fetch(&locator)?),
        }
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Content(bytes)
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Self::Content(bytes.to_vec())
    }
}
