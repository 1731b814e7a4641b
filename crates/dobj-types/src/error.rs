use thiserror::Error;

/// Errors produced while parsing a resource URI.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UriError {
    #[error("resource uri must not be empty")]
    Empty,

    #[error("resource uri has an empty container: {0:?}")]
    EmptyContainer(String),
}
