//! Request and response bodies.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use dobj_engine::Payload;

use crate::error::ApiError;

/// Body of `POST /v1/objects` and `PUT /v1/objects`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ObjectBody {
    pub uri: String,
    /// Base64-encoded content.
    #[serde(default)]
    pub content: Option<String>,
    /// Locator to fetch the content from.
    #[serde(default)]
    pub source: Option<String>,
}

impl ObjectBody {
    /// Exactly one of `content` and `source` must be present.
    pub fn into_payload(self) -> Result<(String, Payload), ApiError> {
        let payload = match (self.content, self.source) {
            (Some(content), None) => {
                let bytes = STANDARD
                    .decode(content.as_bytes())
                    .map_err(|e| ApiError::BadRequest(format!("content is not valid base64: {e}")))?;
                Payload::Content(bytes)
            }
            (None, Some(source)) => Payload::Source(source),
            (Some(_), Some(_)) => {
                return Err(ApiError::BadRequest("content and source are mutually exclusive".into()))
            }
            (None, None) => return Err(ApiError::BadRequest("one of content or source is required".into())),
        };
        Ok((self.uri, payload))
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct UriQuery {
    pub uri: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DeleteQuery {
    pub uri: String,
    #[serde(default)]
    pub recursive: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PublishQuery {
    pub uri: String,
    pub ttl: Option<u64>,
}

/// Query string of a published link.
#[derive(Clone, Debug, Deserialize)]
pub struct SharedQuery {
    pub expires: i64,
    pub signature: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistsResponse {
    pub exists: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}
