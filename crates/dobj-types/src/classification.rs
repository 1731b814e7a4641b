use std::fmt;

use serde::{Deserialize, Serialize};

/// What a resource URI denotes at a given instant.
///
/// Collections and containers are never stored as entities of their own:
/// they are inferred from the keys present in the blob store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// The container itself (empty key).
    Container,
    /// A key that prefixes one or more stored objects.
    Collection,
    /// A key that is exactly one stored object.
    Leaf,
    /// Nothing exists at this URI.
    Absent,
}

impl Classification {
    /// Returns `true` for `Container` and `Collection`.
    pub fn is_aggregate(&self) -> bool {
        matches!(self, Self::Container | Self::Collection)
    }

    /// Returns `true` for anything but `Absent`.
    pub fn exists(&self) -> bool {
        !matches!(self, Self::Absent)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::Collection => "collection",
            Self::Leaf => "leaf",
            Self::Absent => "absent",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
