use serde::{Deserialize, Serialize};

use dobj_types::{DEFAULT_TTL_SECS, MAX_TTL_SECS};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Link lifetime used by `publish` when the caller passes none.
    pub default_ttl_secs: u64,
    /// Longest link lifetime `publish` accepts.
    pub max_ttl_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: DEFAULT_TTL_SECS,
            max_ttl_secs: MAX_TTL_SECS,
        }
    }
}
