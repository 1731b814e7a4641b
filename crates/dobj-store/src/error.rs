/// Errors from blob-store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The container does not exist.
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    /// A container with this name already exists.
    #[error("container already exists: {0}")]
    ContainerAlreadyExists(String),

    /// The container still holds objects and cannot be removed.
    #[error("container not empty: {0}")]
    ContainerNotEmpty(String),

    /// No object is stored at this exact key.
    #[error("object not found: {container}/{key}")]
    ObjectNotFound { container: String, key: String },

    /// The container name or key is not acceptable to this backend.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub(crate) fn object_not_found(container: &str, key: &str) -> Self {
        Self::ObjectNotFound {
            container: container.to_string(),
            key: key.to_string(),
        }
    }

    pub(crate) fn invalid_name(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
