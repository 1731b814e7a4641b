use thiserror::Error;

use dobj_source::FetchError;
use dobj_store::StoreError;
use dobj_types::UriError;

/// Every way a lifecycle operation can fail.
///
/// All variants are terminal for the call; the engine never retries.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid resource {uri:?}: {reason}")]
    InvalidResource { uri: String, reason: String },

    #[error("resource already exists: {0}")]
    AlreadyExists(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("resource is a container or collection, not an object: {0}")]
    NotAnObject(String),

    #[error("resource is a container or collection, delete requires recursive: {0}")]
    CollectionRequiresRecursive(String),

    #[error("invalid source {locator:?}: {reason}")]
    InvalidSource { locator: String, reason: String },

    #[error("source unreachable {locator:?}: {reason}")]
    SourceUnreachable { locator: String, reason: String },

    #[error("invalid ttl {ttl}: must be between 1 and {max} seconds")]
    InvalidTtl { ttl: u64, max: u64 },

    #[error("external service failure: {0}")]
    ExternalServiceFailure(#[source] StoreError),
}

impl EngineError {
    /// Stable machine-readable name of the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidResource { .. } => "invalid_resource",
            Self::AlreadyExists(_) => "already_exists",
            Self::NotFound(_) => "not_found",
            Self::NotAnObject(_) => "not_an_object",
            Self::CollectionRequiresRecursive(_) => "collection_requires_recursive",
            Self::InvalidSource { .. } => "invalid_source",
            Self::SourceUnreachable { .. } => "source_unreachable",
            Self::InvalidTtl { .. } => "invalid_ttl",
            Self::ExternalServiceFailure(_) => "external_service_failure",
        }
    }

    pub(crate) fn invalid_resource(uri: &str, reason: impl Into<String>) -> Self {
        Self::InvalidResource {
            uri: uri.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn from_uri(uri: &str, e: UriError) -> Self {
        Self::invalid_resource(uri, e.to_string())
    }

    /// Attribute meaning to a blob-store failure where possible.
    ///
    /// A missing object becomes `NotFound`, a name the backend refuses
    /// becomes `InvalidResource`, anything else is wrapped opaquely.
    pub(crate) fn from_store(uri: &str, e: StoreError) -> Self {
        match e {
            StoreError::ObjectNotFound { .. } | StoreError::ContainerNotFound(_) => {
                Self::NotFound(uri.to_string())
            }
            StoreError::InvalidName { name, reason } => {
                Self::invalid_resource(uri, format!("{name:?}: {reason}"))
            }
            other => Self::ExternalServiceFailure(other),
        }
    }
}

impl From<FetchError> for EngineError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::InvalidLocator { locator, reason } => Self::InvalidSource { locator, reason },
            FetchError::TooLarge { locator, limit } => Self::InvalidSource {
                locator,
                reason: format!("exceeds {limit} bytes"),
            },
            FetchError::Unreachable { locator, reason } => Self::SourceUnreachable { locator, reason },
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
