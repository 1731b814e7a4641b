use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UriError;

/// Path separator inside a resource URI.
pub const SEPARATOR: char = '/';

/// A resource URI resolved into its container and key.
///
/// `"bucket"` addresses the container itself (empty key), `"bucket/a/b"`
/// addresses key `"a/b"` inside container `"bucket"`. The container is never
/// empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceUri {
    container: String,
    key: String,
}

impl ResourceUri {
    /// Parse a raw URI string. See [`resolve`].
    pub fn parse(uri: &str) -> Result<Self, UriError> {
        let (container, key) = resolve(uri)?;
        Ok(Self {
            container: container.to_string(),
            key: key.to_string(),
        })
    }

    /// Build a URI from an already split container and key, taken verbatim.
    ///
    /// Unlike [`parse`](Self::parse), no separator is stripped from the key,
    /// so keys ending in `/` survive.
    pub fn from_parts(container: &str, key: &str) -> Result<Self, UriError> {
        if container.is_empty() {
            return Err(UriError::EmptyContainer(format!("{SEPARATOR}{key}")));
        }
        Ok(Self {
            container: container.to_string(),
            key: key.to_string(),
        })
    }

    /// The container (first path segment).
    pub fn container(&self) -> &str {
        &self.container
    }

    /// The key inside the container. Empty when the URI names the container.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns `true` if this URI addresses the container itself.
    pub fn is_container(&self) -> bool {
        self.key.is_empty()
    }

    /// Prefix shared by every entry nested under this URI.
    ///
    /// `""` for a container, `"key/"` otherwise.
    pub fn collection_prefix(&self) -> String {
        if self.key.is_empty() {
            String::new()
        } else {
            format!("{}{SEPARATOR}", self.key)
        }
    }

    /// The URI of an entry nested directly under this one.
    pub fn child(&self, name: &str) -> Self {
        let name = name.trim_matches(SEPARATOR);
        let key = if self.key.is_empty() {
            name.to_string()
        } else {
            format!("{}{SEPARATOR}{name}", self.key)
        };
        Self {
            container: self.container.clone(),
            key,
        }
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.key.is_empty() {
            write!(f, "{}", self.container)
        } else {
            write!(f, "{}{SEPARATOR}{}", self.container, self.key)
        }
    }
}

impl FromStr for ResourceUri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Split a resource URI into `(container, key)`.
///
/// Exactly one trailing separator is stripped, then the URI is split on its
/// first separator. Everything after it is the key, nested separators
/// included. A URI without a separator yields an empty key.
///
/// # Examples
///
/// ```
/// use dobj_types::resolve;
///
/// assert_eq!(resolve("bucket").unwrap(), ("bucket", ""));
/// assert_eq!(resolve("bucket/dir/obj").unwrap(), ("bucket", "dir/obj"));
/// assert_eq!(resolve("bucket/dir/").unwrap(), ("bucket", "dir"));
/// assert!(resolve("").is_err());
/// assert!(resolve("/obj").is_err());
/// ```
pub fn resolve(uri: &str) -> Result<(&str, &str), UriError> {
    if uri.is_empty() {
        return Err(UriError::Empty);
    }

    let trimmed = uri.strip_suffix(SEPARATOR).unwrap_or(uri);
    let (container, key) = trimmed.split_once(SEPARATOR).unwrap_or((trimmed, ""));

    if container.is_empty() {
        return Err(UriError::EmptyContainer(uri.to_string()));
    }

    Ok((container, key))
}
